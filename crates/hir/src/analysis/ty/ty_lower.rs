//! Lowering of HIR type expressions into [`Ty`].

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use smol_str::SmolStr;
use tracing::trace;

use super::{
    bound::{AppliedArg, AppliedArgs},
    context::TyCtxt,
    diagnostics::{PathResDiag, TyLowerDiag},
    ty_def::{AdtTy, DynTy, InferTy, Mutability, ParamTy, ProjectionTy, Ty},
};
use crate::{
    analysis::name_resolution::resolve_path,
    hir_def::{DefId, GenericArg, GenericArgs, GenericParam, ItemKind, TraitItemKind, TypePath, TypeRef},
};
use common::diagnostics::Span;

/// The generic parameters visible at some point, innermost last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericScope {
    params: SmallVec<[ParamTy; 4]>,
}

impl GenericScope {
    pub fn from_params(params: impl IntoIterator<Item = ParamTy>) -> Self {
        Self {
            params: params.into_iter().collect(),
        }
    }

    pub fn push(&mut self, param: ParamTy) {
        self.params.push(param);
    }

    /// Finds the innermost parameter named `name`.
    pub fn lookup(&self, name: &str) -> Option<&ParamTy> {
        self.params.iter().rev().find(|param| param.name == name)
    }

    pub fn params(&self) -> &[ParamTy] {
        &self.params
    }
}

fn mutability(mutable: bool) -> Mutability {
    if mutable {
        Mutability::Mut
    } else {
        Mutability::Not
    }
}

impl<'db> TyCtxt<'db, '_> {
    pub fn lower_ty(&mut self, ty: &TypeRef, scope: &GenericScope) -> Ty {
        match ty {
            TypeRef::Path(path) => self.lower_path_ty(path, scope),
            TypeRef::Ref { mutable, inner } => {
                Ty::Ref(mutability(*mutable), Box::new(self.lower_ty(inner, scope)))
            }
            TypeRef::Ptr { mutable, inner } => {
                Ty::Ptr(mutability(*mutable), Box::new(self.lower_ty(inner, scope)))
            }
            TypeRef::Tuple(elems) => {
                Ty::Tuple(elems.iter().map(|elem| self.lower_ty(elem, scope)).collect())
            }
            TypeRef::Array { elem, len } => Ty::Array(Box::new(self.lower_ty(elem, scope)), *len),
            TypeRef::Slice(elem) => Ty::Slice(Box::new(self.lower_ty(elem, scope))),
            TypeRef::TraitObject(bounds) => self.lower_trait_object(bounds, scope),
            TypeRef::Never => Ty::Never,
            TypeRef::Infer => Ty::Infer(InferTy::General),
        }
    }

    fn lower_path_ty(&mut self, path: &TypePath, scope: &GenericScope) -> Ty {
        match path.segments.as_slice() {
            [single] => {
                if let Some(param) = scope.lookup(&single.ident) {
                    return Ty::Param(param.clone());
                }
                if let Some(prim) = Ty::from_primitive_name(&single.ident) {
                    return prim;
                }
            }
            [first, assoc] => {
                if let Some(param) = scope.lookup(&first.ident) {
                    let param = param.clone();
                    return self.lower_projection(param, &assoc.ident, path.span);
                }
            }
            _ => {}
        }

        let db = self.db;
        let def_id = match resolve_path(db, path) {
            Ok(def_id) => def_id,
            Err(err) => {
                self.cx.push_diag(err.into_diag(db, path).into());
                return Ty::Error;
            }
        };

        let Some(ItemKind::Adt(adt)) = db.item(def_id).map(|item| &item.kind) else {
            self.cx.push_diag(
                PathResDiag::ExpectedType {
                    span: path.span,
                    path: path.plain(),
                }
                .into(),
            );
            return Ty::Error;
        };

        let args: Vec<Ty> = path
            .generic_args()
            .map(|generic_args| {
                generic_args
                    .args
                    .iter()
                    .filter_map(|arg| match arg {
                        GenericArg::Type(ty) => Some(self.lower_ty(ty, scope)),
                        GenericArg::Lifetime(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let expected = adt.type_params().count();
        if args.len() != expected {
            self.cx.push_diag(
                TyLowerDiag::AdtArgNumMismatch {
                    span: path.span,
                    adt: adt.name.clone(),
                    expected,
                    given: args.len(),
                }
                .into(),
            );
            return Ty::Error;
        }

        Ty::Adt(AdtTy {
            def: def_id,
            name: adt.name.clone(),
            args,
        })
    }

    /// `P::Name`, looked up through the bounds attached to `P` and their
    /// super-traits.
    fn lower_projection(&mut self, param: ParamTy, name: &SmolStr, span: Span) -> Ty {
        // Stack order: the first written bound is searched first.
        let pending: Vec<DefId> = self
            .cx
            .param_bounds(param.hir_id)
            .map(|bounds| {
                bounds
                    .specified_bounds()
                    .iter()
                    .rev()
                    .filter_map(|bound| bound.trait_id())
                    .collect()
            })
            .unwrap_or_default();
        let found = self.find_assoc_type(pending, name);

        match found {
            Some((trait_id, trait_name)) => {
                trace!(%param.name, %name, %trait_name, "resolved projection");
                Ty::Projection(ProjectionTy {
                    self_ty: Box::new(Ty::Param(param)),
                    trait_id,
                    trait_name,
                    name: name.clone(),
                })
            }
            None => {
                self.cx.push_diag(
                    TyLowerDiag::UnknownAssocType {
                        span,
                        param: param.name,
                        name: name.clone(),
                    }
                    .into(),
                );
                Ty::Error
            }
        }
    }

    /// Searches the traits in `pending`, then their super-traits, for an
    /// associated type `name`. Returns the declaring trait.
    fn find_assoc_type(&self, mut pending: Vec<DefId>, name: &str) -> Option<(DefId, SmolStr)> {
        let db = self.db;
        let mut visited = FxHashSet::default();
        while let Some(trait_id) = pending.pop() {
            if !visited.insert(trait_id) {
                continue;
            }
            let Some(trait_) = db.trait_def(trait_id) else {
                continue;
            };
            if trait_
                .item(name)
                .is_some_and(|item| matches!(item.kind, TraitItemKind::Type { .. }))
            {
                return Some((trait_id, trait_.name.clone()));
            }
            if let Some(trait_ref) = self.cx.lookup_trait_reference(trait_id) {
                pending.extend(
                    trait_ref
                        .super_traits()
                        .iter()
                        .rev()
                        .filter_map(|bound| bound.trait_id()),
                );
            }
        }
        None
    }

    /// `dyn A + B`. Every bound must be object safe; the check for a trait
    /// that is still being resolved runs once it is cached.
    fn lower_trait_object(&mut self, bounds: &[TypePath], scope: &GenericScope) -> Ty {
        let db = self.db;
        let mut dyn_bounds = Vec::with_capacity(bounds.len());
        for path in bounds {
            let predicate = self.predicate_from_bound(path, scope, false);
            let Some(trait_id) = predicate.trait_id().filter(|_| !predicate.has_error_flag()) else {
                return Ty::Error;
            };

            if predicate.get(self.cx).is_some() {
                if !predicate.is_object_safe(self.cx, true, path.span) {
                    return Ty::Error;
                }
            } else {
                self.cx.defer_object_safety(trait_id, path.span);
            }
            dyn_bounds.extend(predicate.to_dyn_bound(db));
        }
        Ty::Dynamic(DynTy { bounds: dyn_bounds })
    }

    pub fn lower_generic_args(&mut self, args: &GenericArgs, scope: &GenericScope) -> AppliedArgs {
        let applied = args
            .args
            .iter()
            .map(|arg| match arg {
                GenericArg::Lifetime(lifetime) => AppliedArg::Lifetime(lifetime.clone()),
                GenericArg::Type(ty) => AppliedArg::Type(self.lower_ty(ty, scope)),
            })
            .collect();
        let bindings = args
            .bindings
            .iter()
            .map(|binding| (binding.name.clone(), self.lower_ty(&binding.ty, scope)))
            .collect();
        AppliedArgs {
            args: applied,
            bindings,
            span: args.span,
        }
    }

    /// Brings `params` into `scope`, records their types and lowers their
    /// bounds. Returns the type parameters in declaration order.
    pub fn lower_generic_params(&mut self, params: &[GenericParam], scope: &mut GenericScope) -> Vec<ParamTy> {
        let type_params: Vec<_> = params.iter().filter_map(GenericParam::as_type).collect();
        let lowered: Vec<ParamTy> = type_params
            .iter()
            .map(|param| ParamTy::new(param.hir_id, param.name.clone()))
            .collect();

        for param in &lowered {
            scope.push(param.clone());
            self.cx.insert_type(param.hir_id, Ty::Param(param.clone()));
        }
        for param in type_params {
            self.lower_param_bounds(param, scope);
        }
        lowered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::ty::context::TypeCheckContext,
        hir_def::{HirId, ItemTree},
    };

    #[test]
    fn scope_lookup_prefers_innermost() {
        let outer = ParamTy::new(HirId::from_u32(0), "T".into());
        let inner = ParamTy::new(HirId::from_u32(1), "T".into());
        let mut scope = GenericScope::from_params([outer]);
        scope.push(inner.clone());
        assert_eq!(scope.lookup("T"), Some(&inner));
        assert_eq!(scope.lookup("U"), None);
    }

    #[test]
    fn lower_builtin_and_adt_types() {
        let mut tree = ItemTree::new("example");
        let vec = tree.add_struct("Vec", &["T"]);
        let mut cx = TypeCheckContext::default();
        let mut tcx = TyCtxt::new(&tree, &mut cx);
        let scope = GenericScope::default();

        let ty = tcx.lower_ty(
            &TypeRef::reference(TypeRef::Path(TypePath::parse("Vec").with_type_args([TypeRef::path("u8")]))),
            &scope,
        );
        assert_eq!(ty.to_string(), "&Vec<u8>");
        assert!(matches!(ty, Ty::Ref(_, ref inner) if matches!(**inner, Ty::Adt(ref adt) if adt.def == vec)));

        let ty = tcx.lower_ty(&TypeRef::path("Vec"), &scope);
        assert_eq!(ty, Ty::Error);
        assert_eq!(cx.diags().count(), 1);
    }

    #[test]
    fn unknown_projection_is_reported() {
        let tree = ItemTree::new("example");
        let mut cx = TypeCheckContext::default();
        let mut tcx = TyCtxt::new(&tree, &mut cx);
        let scope = GenericScope::from_params([ParamTy::new(HirId::from_u32(0), "T".into())]);

        assert_eq!(tcx.lower_ty(&TypeRef::path("T::Item"), &scope), Ty::Error);
        assert!(matches!(
            cx.diags().next(),
            Some(crate::analysis::ty::diagnostics::TyDiag::TyLower(TyLowerDiag::UnknownAssocType { .. }))
        ));
    }
}
