//! Trait bounds applied at a use site.

use std::rc::Rc;

use common::diagnostics::Span;
use smol_str::SmolStr;
use tracing::debug;

use super::{
    context::TypeCheckContext,
    fold::specialize,
    subst::{SubstitutionArg, SubstitutionArgumentMappings, SubstitutionParamMapping},
    trait_def::{AssocItemKind, TraitItemReference, TraitReference},
    trait_lower::TraitArgError,
    ty_def::{DynBound, Ty},
};
use crate::{HirDb, hir_def::DefId};

/// A trait applied to a receiver and a (possibly still unbound) argument
/// list, i.e. the semantic form of `T: Trait<Arg>`.
///
/// The predicate only stores the trait's `DefId`; the [`TraitReference`] is
/// looked up from the context whenever it is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeBoundPredicate {
    trait_id: Option<DefId>,
    substitutions: Vec<SubstitutionParamMapping>,
    /// Slot 0 is the receiver.
    used_arguments: SubstitutionArgumentMappings,
    assoc_type_bindings: Vec<(SmolStr, Ty)>,
    span: Span,
    error_flag: bool,
}

impl TypeBoundPredicate {
    pub fn new(trait_ref: &TraitReference, span: Span) -> Self {
        match trait_ref.def_id() {
            Some(def_id) => Self::from_raw(def_id, trait_ref.trait_substs().to_vec(), span),
            None => Self::error(),
        }
    }

    /// Builds a predicate from a declaration that may not be resolved yet.
    /// Every parameter, the receiver included, starts out unbound.
    pub fn from_raw(
        trait_id: DefId,
        substitutions: Vec<SubstitutionParamMapping>,
        span: Span,
    ) -> Self {
        if substitutions.is_empty() {
            return Self::error();
        }

        let used = substitutions
            .iter()
            .map(SubstitutionParamMapping::unbound)
            .collect();
        Self {
            trait_id: Some(trait_id),
            used_arguments: SubstitutionArgumentMappings::new(used, Some(span)),
            substitutions,
            assoc_type_bindings: Vec::new(),
            span,
            error_flag: false,
        }
    }

    pub fn error() -> Self {
        Self {
            trait_id: None,
            substitutions: Vec::new(),
            used_arguments: SubstitutionArgumentMappings::error(),
            assoc_type_bindings: Vec::new(),
            span: Span::default(),
            error_flag: true,
        }
    }

    pub fn trait_id(&self) -> Option<DefId> {
        self.trait_id
    }

    /// The backing trait reference, if it is cached.
    pub fn get<'cx>(&self, cx: &'cx TypeCheckContext) -> Option<&'cx Rc<TraitReference>> {
        cx.lookup_trait_reference(self.trait_id?)
    }

    fn get_checked<'cx>(&self, cx: &'cx TypeCheckContext) -> Option<&'cx Rc<TraitReference>> {
        if self.error_flag {
            return None;
        }
        self.get(cx)
    }

    /// `true` if the error flag is set or the trait is not (yet) cached.
    pub fn is_error(&self, cx: &TypeCheckContext) -> bool {
        self.get_checked(cx).is_none()
    }

    pub fn has_error_flag(&self) -> bool {
        self.error_flag
    }

    pub fn requires_generic_args(&self, cx: &TypeCheckContext) -> bool {
        !self.is_error(cx) && self.substitutions.len() > 1
    }

    pub fn substitutions(&self) -> &[SubstitutionParamMapping] {
        &self.substitutions
    }

    pub fn used_arguments(&self) -> &SubstitutionArgumentMappings {
        &self.used_arguments
    }

    pub fn assoc_type_bindings(&self) -> &[(SmolStr, Ty)] {
        &self.assoc_type_bindings
    }

    pub fn assoc_type_binding(&self, name: &str) -> Option<&Ty> {
        self.assoc_type_bindings
            .iter()
            .find_map(|(binding, ty)| (binding == name).then_some(ty))
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn receiver(&self) -> Option<&Ty> {
        self.used_arguments.get(0)?.ty()
    }

    /// Binds the receiver slot. Arguments filled from defaults that mention
    /// the trait's own `Self` are specialized for the new receiver.
    pub fn bind_receiver(&mut self, receiver: Ty) {
        if !self.error_flag {
            self.used_arguments.rebind(0, receiver);
            specialize_receiver(&mut self.used_arguments);
        }
    }

    /// Binds the arguments written at a use site, keeping the receiver slot.
    ///
    /// Missing trailing arguments are filled from parameter defaults, with
    /// `Self` in a default meaning the receiver. On an arity or kind mismatch
    /// the error flag is set and nothing else changes.
    ///
    /// # Panics
    /// Panics if called on a predicate without parameters, such as
    /// [`TypeBoundPredicate::error`].
    pub fn apply_generic_arguments(&mut self, args: &AppliedArgs) -> Result<(), TraitArgError> {
        assert!(
            !self.used_arguments.is_empty() && !self.substitutions.is_empty(),
            "generic arguments applied to a predicate without parameters"
        );

        let result = self.compute_arguments(args);
        match result {
            Ok(used_arguments) => {
                debug!(args = %used_arguments, "applied generic arguments");
                self.used_arguments = used_arguments;
                self.assoc_type_bindings = args.bindings.clone();
                Ok(())
            }
            Err(err) => {
                debug!(%err, "rejected generic arguments");
                self.error_flag = true;
                Err(err)
            }
        }
    }

    fn compute_arguments(&self, args: &AppliedArgs) -> Result<SubstitutionArgumentMappings, TraitArgError> {
        let mut types = Vec::with_capacity(args.args.len());
        for arg in &args.args {
            match arg {
                AppliedArg::Lifetime(lifetime) if !types.is_empty() => {
                    return Err(TraitArgError::ArgKindMisMatch {
                        lifetime: lifetime.clone(),
                    });
                }
                AppliedArg::Lifetime(_) => {}
                AppliedArg::Type(ty) => types.push(ty),
            }
        }

        let params = &self.substitutions[1..];
        let required = params
            .iter()
            .rposition(|param| param.default().is_none())
            .map_or(0, |idx| idx + 1);
        if types.len() > params.len() || types.len() < required {
            return Err(TraitArgError::ArgNumMismatch {
                expected: params.len(),
                given: types.len(),
            });
        }

        let mut mappings: Vec<SubstitutionArg> = Vec::with_capacity(self.substitutions.len());
        mappings.extend(self.used_arguments.get(0).cloned());
        for (idx, param) in params.iter().enumerate() {
            let ty = match types.get(idx) {
                Some(ty) => (*ty).clone(),
                None => {
                    let partial = SubstitutionArgumentMappings::new(mappings.clone(), None);
                    param
                        .default()
                        .map_or(Ty::Error, |default| specialize(default, &partial))
                }
            };
            mappings.push(param.bind(ty));
        }

        Ok(SubstitutionArgumentMappings::new(mappings, Some(args.span)))
    }

    pub fn contains_item(&self, cx: &TypeCheckContext, name: &str) -> bool {
        self.get_checked(cx)
            .is_some_and(|trait_ref| trait_ref.lookup_trait_item(name).is_some())
    }

    /// Looks up `name` among the items of the backing trait. Returns the
    /// error item if the predicate is in error or the trait has no such item.
    pub fn lookup_associated_item(&self, cx: &TypeCheckContext, name: &str) -> TypeBoundPredicateItem<'_> {
        let Some(trait_ref) = self.get_checked(cx) else {
            return TypeBoundPredicateItem::error();
        };
        match trait_ref.lookup_trait_item_index(name) {
            Some(index) => TypeBoundPredicateItem {
                parent: Some(self),
                trait_ref: Some(trait_ref.clone()),
                index,
            },
            None => TypeBoundPredicateItem::error(),
        }
    }

    pub fn is_object_safe(&self, cx: &mut TypeCheckContext, emit_error: bool, span: Span) -> bool {
        match self.get_checked(cx).cloned() {
            Some(trait_ref) => trait_ref.is_object_safe(cx, emit_error, span),
            None => false,
        }
    }

    /// The canonical path of the trait, e.g. `example::fmt::Display`.
    pub fn name(&self, db: &dyn HirDb) -> String {
        self.trait_id
            .and_then(|def_id| db.canonical_path(def_id))
            .map_or_else(|| "<error>".to_string(), |path| path.to_string())
    }

    /// The trait's name followed by the non-receiver arguments.
    pub fn pretty_print(&self, db: &dyn HirDb) -> String {
        let args: Vec<String> = self
            .used_arguments
            .iter()
            .skip(1)
            .map(|arg| arg.ty().map_or_else(|| arg.param().name.to_string(), Ty::to_string))
            .collect();
        if args.is_empty() {
            self.name(db)
        } else {
            format!("{}<{}>", self.name(db), args.join(", "))
        }
    }

    pub(crate) fn to_dyn_bound(&self, db: &dyn HirDb) -> Option<DynBound> {
        let trait_id = self.trait_id?;
        let trait_name = db.trait_def(trait_id)?.name.clone();
        let args = self
            .used_arguments
            .iter()
            .skip(1)
            .map(|arg| arg.ty().cloned().unwrap_or(Ty::Error))
            .collect();
        Some(DynBound {
            trait_id,
            trait_name,
            args,
        })
    }
}

/// Replaces the receiver parameter inside the non-receiver arguments with the
/// type bound to slot 0.
fn specialize_receiver(args: &mut SubstitutionArgumentMappings) {
    let receiver_only =
        SubstitutionArgumentMappings::new(args.get(0).cloned().into_iter().collect(), None);
    args.map_args(|ty| specialize(ty, &receiver_only));
}

/// Generic arguments of a bound after type lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedArgs {
    pub args: Vec<AppliedArg>,
    pub bindings: Vec<(SmolStr, Ty)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedArg {
    Lifetime(SmolStr),
    Type(Ty),
}

impl AppliedArgs {
    pub fn new(span: Span) -> Self {
        Self {
            args: Vec::new(),
            bindings: Vec::new(),
            span,
        }
    }

    pub fn from_types(types: impl IntoIterator<Item = Ty>, span: Span) -> Self {
        Self {
            args: types.into_iter().map(AppliedArg::Type).collect(),
            bindings: Vec::new(),
            span,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.bindings.is_empty()
    }
}

/// One item of a trait, seen through a predicate. Borrows the predicate so
/// that the item's type can be specialized with its arguments.
#[derive(Debug, Clone)]
pub struct TypeBoundPredicateItem<'a> {
    parent: Option<&'a TypeBoundPredicate>,
    trait_ref: Option<Rc<TraitReference>>,
    index: usize,
}

impl<'a> TypeBoundPredicateItem<'a> {
    pub fn error() -> Self {
        Self {
            parent: None,
            trait_ref: None,
            index: 0,
        }
    }

    pub fn is_error(&self) -> bool {
        self.raw_item().is_none_or(TraitItemReference::is_error)
    }

    pub fn parent(&self) -> Option<&'a TypeBoundPredicate> {
        self.parent
    }

    pub fn raw_item(&self) -> Option<&TraitItemReference> {
        self.trait_ref.as_ref()?.items().get(self.index)
    }

    /// `true` if an implementation must provide this item.
    pub fn needs_implementation(&self) -> bool {
        !self.is_error() && self.raw_item().is_some_and(|item| !item.is_optional())
    }

    /// The item's type for `receiver`. Associated types and predicates
    /// without arguments yield the declared type unchanged; otherwise the
    /// receiver slot of a copy of the predicate's arguments is bound to
    /// `receiver` and the declared type is specialized with it.
    pub fn get_tyty_for_receiver(&self, receiver: &Ty) -> Ty {
        let (Some(parent), Some(item)) = (self.parent, self.raw_item()) else {
            return Ty::Error;
        };
        if item.is_error() {
            return Ty::Error;
        }

        let item_ty = item.ty();
        if parent.used_arguments.is_empty() || item.kind() == AssocItemKind::Type {
            return item_ty.clone();
        }

        let mut gargs = parent.used_arguments.clone();
        gargs.rebind(0, receiver.clone());
        specialize_receiver(&mut gargs);

        debug!(item = %item.identifier(), %receiver, args = %gargs, "specializing trait item");
        specialize(item_ty, &gargs)
    }
}

/// An ordered list of predicates attached to one type, e.g. the bounds of a
/// generic parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeBoundsMappings {
    specified_bounds: Vec<TypeBoundPredicate>,
}

impl TypeBoundsMappings {
    pub fn new(specified_bounds: Vec<TypeBoundPredicate>) -> Self {
        Self { specified_bounds }
    }

    pub fn specified_bounds(&self) -> &[TypeBoundPredicate] {
        &self.specified_bounds
    }

    pub fn into_specified_bounds(self) -> Vec<TypeBoundPredicate> {
        self.specified_bounds
    }

    pub fn num_specified_bounds(&self) -> usize {
        self.specified_bounds.len()
    }

    /// Adds `predicate` unless an identical one is already present.
    pub fn add_bound(&mut self, predicate: TypeBoundPredicate) {
        if !self.specified_bounds.contains(&predicate) {
            self.specified_bounds.push(predicate);
        }
    }

    pub fn contains_trait(&self, def_id: DefId) -> bool {
        self.specified_bounds
            .iter()
            .any(|bound| bound.trait_id() == Some(def_id))
    }

    /// `A + B`
    pub fn raw_bounds_as_string(&self, db: &dyn HirDb) -> String {
        self.specified_bounds
            .iter()
            .map(|bound| bound.pretty_print(db))
            .collect::<Vec<_>>()
            .join(" + ")
    }

    /// `bounds:[A + B]`
    pub fn bounds_as_string(&self, db: &dyn HirDb) -> String {
        format!("bounds:[{}]", self.raw_bounds_as_string(db))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::ty::ty_def::ParamTy, hir_def::HirId};

    fn params(names: &[&str]) -> Vec<SubstitutionParamMapping> {
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                SubstitutionParamMapping::new(
                    ParamTy::new(HirId::from_u32(idx as u32), (*name).into()),
                    None,
                    Span::default(),
                )
            })
            .collect()
    }

    #[test]
    fn raw_predicate_allocates_every_slot() {
        let pred = TypeBoundPredicate::from_raw(DefId::from_u32(0), params(&["Self", "A", "B"]), Span::default());
        assert_eq!(pred.used_arguments().len(), pred.substitutions().len());
        assert_eq!(pred.receiver(), None);
        assert!(!pred.has_error_flag());
    }

    #[test]
    fn arity_mismatch_keeps_arguments() {
        let mut pred = TypeBoundPredicate::from_raw(DefId::from_u32(0), params(&["Self", "T"]), Span::default());
        let before = pred.used_arguments().clone();

        let err = pred
            .apply_generic_arguments(&AppliedArgs::from_types([Ty::Bool, Ty::Char], Span::default()))
            .unwrap_err();
        assert_eq!(
            err,
            TraitArgError::ArgNumMismatch {
                expected: 1,
                given: 2
            }
        );
        assert!(pred.has_error_flag());
        assert_eq!(pred.used_arguments(), &before);
    }

    #[test]
    fn lifetime_after_type_is_a_kind_mismatch() {
        let mut pred = TypeBoundPredicate::from_raw(DefId::from_u32(0), params(&["Self", "T"]), Span::default());
        let args = AppliedArgs {
            args: vec![AppliedArg::Type(Ty::Bool), AppliedArg::Lifetime("a".into())],
            bindings: vec![],
            span: Span::default(),
        };
        assert!(matches!(
            pred.apply_generic_arguments(&args),
            Err(TraitArgError::ArgKindMisMatch { .. })
        ));
    }

    #[test]
    fn leading_lifetimes_are_ignored() {
        let mut pred = TypeBoundPredicate::from_raw(DefId::from_u32(0), params(&["Self", "T"]), Span::default());
        let args = AppliedArgs {
            args: vec![AppliedArg::Lifetime("a".into()), AppliedArg::Type(Ty::Bool)],
            bindings: vec![],
            span: Span::default(),
        };
        pred.apply_generic_arguments(&args).unwrap();
        assert_eq!(pred.used_arguments().get(1).and_then(SubstitutionArg::ty), Some(&Ty::Bool));
    }

    #[test]
    #[should_panic(expected = "without parameters")]
    fn applying_to_error_predicate_panics() {
        let mut pred = TypeBoundPredicate::error();
        let _ = pred.apply_generic_arguments(&AppliedArgs::new(Span::default()));
    }

    #[test]
    fn error_item_is_inert() {
        let item = TypeBoundPredicateItem::error();
        assert!(item.is_error());
        assert!(!item.needs_implementation());
        assert!(item.raw_item().is_none());
        assert_eq!(item.get_tyty_for_receiver(&Ty::Bool), Ty::Error);
    }
}
