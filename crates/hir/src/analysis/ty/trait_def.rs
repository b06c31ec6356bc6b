//! Resolved trait declarations.

use std::fmt;

use common::diagnostics::Span;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::{
    bound::TypeBoundPredicate,
    context::TypeCheckContext,
    diagnostics::TyLowerDiag,
    subst::SubstitutionParamMapping,
    ty_def::{ParamTy, Ty},
};
use crate::hir_def::{DefId, HirId};

/// A trait declaration after resolution: its parameters, items and
/// super-traits. References are created once per declaration and shared
/// through the [`TypeCheckContext`] cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitReference {
    /// `None` only for the error reference.
    def_id: Option<DefId>,
    name: SmolStr,
    span: Span,
    items: Vec<TraitItemReference>,
    /// Bounds on the receiver other than the trait itself.
    super_traits: Vec<TypeBoundPredicate>,
    /// Declared type parameters; the receiver `Self` is always first.
    substitutions: Vec<SubstitutionParamMapping>,
}

impl TraitReference {
    pub fn new(
        def_id: DefId,
        name: SmolStr,
        span: Span,
        items: Vec<TraitItemReference>,
        super_traits: Vec<TypeBoundPredicate>,
        substitutions: Vec<SubstitutionParamMapping>,
    ) -> Self {
        Self {
            def_id: Some(def_id),
            name,
            span,
            items,
            super_traits,
            substitutions,
        }
    }

    /// The reference returned for every failed resolution.
    pub fn error() -> Self {
        Self {
            def_id: None,
            name: "<error>".into(),
            span: Span::default(),
            items: Vec::new(),
            super_traits: Vec::new(),
            substitutions: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.def_id.is_none()
    }

    pub fn def_id(&self) -> Option<DefId> {
        self.def_id
    }

    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn items(&self) -> &[TraitItemReference] {
        &self.items
    }

    pub fn lookup_trait_item(&self, name: &str) -> Option<&TraitItemReference> {
        self.items.iter().find(|item| item.identifier == name)
    }

    pub fn lookup_trait_item_by_kind(
        &self,
        name: &str,
        kind: AssocItemKind,
    ) -> Option<&TraitItemReference> {
        self.items
            .iter()
            .find(|item| item.identifier == name && item.kind == kind)
    }

    pub(crate) fn lookup_trait_item_index(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|item| item.identifier == name)
    }

    pub fn trait_substs(&self) -> &[SubstitutionParamMapping] {
        &self.substitutions
    }

    /// The implicit `Self` parameter.
    pub fn receiver(&self) -> Option<&ParamTy> {
        self.substitutions.first().map(SubstitutionParamMapping::param)
    }

    pub fn super_traits(&self) -> &[TypeBoundPredicate] {
        &self.super_traits
    }

    pub fn is_equal(&self, other: &TraitReference) -> bool {
        !self.is_error() && self.def_id == other.def_id
    }

    /// Returns `true` if implementing `self` implies implementing `reference`,
    /// either because they are the same trait or through super-traits.
    pub fn satisfies_bound(&self, cx: &TypeCheckContext, reference: &TraitReference) -> bool {
        let mut visited = FxHashSet::default();
        self.satisfies_bound_impl(cx, reference, &mut visited)
    }

    fn satisfies_bound_impl(
        &self,
        cx: &TypeCheckContext,
        reference: &TraitReference,
        visited: &mut FxHashSet<DefId>,
    ) -> bool {
        if self.is_equal(reference) {
            return true;
        }
        let Some(def_id) = self.def_id else {
            return false;
        };
        if !visited.insert(def_id) {
            return false;
        }

        self.super_traits.iter().any(|bound| {
            bound
                .get(cx)
                .is_some_and(|super_ref| super_ref.satisfies_bound_impl(cx, reference, visited))
        })
    }

    /// Checks that the trait can be used behind `dyn`, optionally reporting a
    /// diagnostic at `span` that lists every offending item and super-trait.
    pub fn is_object_safe(&self, cx: &mut TypeCheckContext, emit_error: bool, span: Span) -> bool {
        let mut visited = FxHashSet::default();
        let violations = self.object_safety_violations();
        let unsafe_super_traits: Vec<SmolStr> = self
            .super_traits
            .iter()
            .filter_map(|bound| bound.get(cx))
            .filter(|super_ref| !super_ref.is_object_safe_impl(cx, &mut visited))
            .map(|super_ref| super_ref.name.clone())
            .collect();

        if violations.is_empty() && unsafe_super_traits.is_empty() {
            return true;
        }

        if emit_error {
            cx.push_diag(
                TyLowerDiag::NotObjectSafe {
                    span,
                    trait_name: self.name.clone(),
                    violations,
                    super_traits: unsafe_super_traits,
                }
                .into(),
            );
        }
        false
    }

    fn is_object_safe_impl(&self, cx: &TypeCheckContext, visited: &mut FxHashSet<DefId>) -> bool {
        if let Some(def_id) = self.def_id {
            if !visited.insert(def_id) {
                return true;
            }
        }

        self.object_safety_violations().is_empty()
            && self.super_traits.iter().all(|bound| {
                bound
                    .get(cx)
                    .is_none_or(|super_ref| super_ref.is_object_safe_impl(cx, visited))
            })
    }

    /// Items of this trait (not its super-traits) that prevent object use.
    pub fn object_safety_violations(&self) -> Vec<ObjectSafetyViolation> {
        self.items
            .iter()
            .filter_map(TraitItemReference::object_safety_violation)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssocItemKind {
    Type,
    Const,
    Fn,
    Error,
}

/// One resolved trait item. Its type is expressed in terms of the trait's
/// parameters; see [`TypeBoundPredicateItem`] for specialization.
///
/// [`TypeBoundPredicateItem`]: super::bound::TypeBoundPredicateItem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitItemReference {
    identifier: SmolStr,
    is_optional: bool,
    kind: AssocItemKind,
    hir_id: Option<HirId>,
    ty: Ty,
    self_ty: Ty,
    substitutions: Vec<SubstitutionParamMapping>,
    span: Span,
}

impl TraitItemReference {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identifier: SmolStr,
        is_optional: bool,
        kind: AssocItemKind,
        hir_id: HirId,
        ty: Ty,
        self_ty: Ty,
        substitutions: Vec<SubstitutionParamMapping>,
        span: Span,
    ) -> Self {
        Self {
            identifier,
            is_optional,
            kind,
            hir_id: Some(hir_id),
            ty,
            self_ty,
            substitutions,
            span,
        }
    }

    pub fn error(identifier: SmolStr, span: Span) -> Self {
        Self {
            identifier,
            is_optional: false,
            kind: AssocItemKind::Error,
            hir_id: None,
            ty: Ty::Error,
            self_ty: Ty::Error,
            substitutions: Vec::new(),
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == AssocItemKind::Error
    }

    pub fn identifier(&self) -> &SmolStr {
        &self.identifier
    }

    /// `true` if the declaration supplies a default.
    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    pub fn kind(&self) -> AssocItemKind {
        self.kind
    }

    pub fn hir_id(&self) -> Option<HirId> {
        self.hir_id
    }

    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    pub fn self_ty(&self) -> &Ty {
        &self.self_ty
    }

    pub fn substitutions(&self) -> &[SubstitutionParamMapping] {
        &self.substitutions
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn object_safety_violation(&self) -> Option<ObjectSafetyViolation> {
        let name = self.identifier.clone();
        let span = self.span;
        match (&self.kind, &self.ty) {
            (AssocItemKind::Const, _) => Some(ObjectSafetyViolation::AssocConst { name, span }),
            (AssocItemKind::Fn, Ty::Fn(func)) if !func.is_method() => {
                Some(ObjectSafetyViolation::NoReceiver { name, span })
            }
            (AssocItemKind::Fn, Ty::Fn(func)) if !func.own_params.is_empty() => {
                Some(ObjectSafetyViolation::GenericMethod { name, span })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectSafetyViolation {
    AssocConst { name: SmolStr, span: Span },
    NoReceiver { name: SmolStr, span: Span },
    GenericMethod { name: SmolStr, span: Span },
}

impl ObjectSafetyViolation {
    pub fn span(&self) -> Span {
        match self {
            Self::AssocConst { span, .. }
            | Self::NoReceiver { span, .. }
            | Self::GenericMethod { span, .. } => *span,
        }
    }
}

impl fmt::Display for ObjectSafetyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssocConst { name, .. } => write!(f, "associated const `{name}` is not allowed"),
            Self::NoReceiver { name, .. } => {
                write!(f, "associated function `{name}` has no `self` receiver")
            }
            Self::GenericMethod { name, .. } => {
                write!(f, "method `{name}` has generic type parameters")
            }
        }
    }
}
