use smol_str::SmolStr;
use tracing::trace;

use super::{
    context::TyCtxt,
    subst::SubstitutionParamMapping,
    trait_def::{AssocItemKind, TraitItemReference},
    ty_def::{FnTy, PlaceholderTy, Ty},
    ty_lower::GenericScope,
};
use crate::hir_def::{DefId, FuncDecl, SelfParam, TraitItem, TraitItemKind, TypeBound};

impl<'db> TyCtxt<'db, '_> {
    /// Resolves one member of the trait `trait_id`. `self_ty` is the trait's
    /// receiver and `substitutions` its parameter list.
    pub fn resolve_trait_item(
        &mut self,
        trait_id: DefId,
        item: &TraitItem,
        self_ty: &Ty,
        substitutions: &[SubstitutionParamMapping],
        scope: &GenericScope,
    ) -> TraitItemReference {
        if item.name.is_empty() || substitutions.is_empty() {
            return TraitItemReference::error(item.name.clone(), item.span);
        }

        let (kind, ty) = match &item.kind {
            TraitItemKind::Type { bounds, default } => {
                let placeholder = Ty::Placeholder(PlaceholderTy {
                    trait_id,
                    name: item.name.clone(),
                });
                for bound in bounds {
                    if let TypeBound::Trait(path) = bound {
                        self.predicate_from_bound(path, scope, false);
                    }
                }
                if let Some(default) = default {
                    self.lower_ty(default, scope);
                }
                (AssocItemKind::Type, placeholder)
            }
            TraitItemKind::Const { ty, .. } => (AssocItemKind::Const, self.lower_ty(ty, scope)),
            TraitItemKind::Func(func) => (
                AssocItemKind::Fn,
                self.lower_fn_sig(&item.name, func, self_ty, scope),
            ),
        };
        trace!(item = %item.name, %ty, "resolved trait item");

        self.cx.insert_type(item.hir_id, ty.clone());
        TraitItemReference::new(
            item.name.clone(),
            item.kind.has_default(),
            kind,
            item.hir_id,
            ty,
            self_ty.clone(),
            substitutions.to_vec(),
            item.span,
        )
    }

    fn lower_fn_sig(&mut self, name: &SmolStr, func: &FuncDecl, self_ty: &Ty, scope: &GenericScope) -> Ty {
        let mut scope = scope.clone();
        let own_params = self.lower_generic_params(&func.generic_params, &mut scope);

        let receiver = func.self_param.map(|self_param| {
            let receiver = match self_param {
                SelfParam::Value => self_ty.clone(),
                SelfParam::Ref => Ty::reference(self_ty.clone()),
                SelfParam::RefMut => Ty::reference_mut(self_ty.clone()),
            };
            Box::new(receiver)
        });
        let params = func
            .params
            .iter()
            .map(|param| self.lower_ty(&param.ty, &scope))
            .collect();
        let ret = match &func.ret_ty {
            Some(ret) => self.lower_ty(ret, &scope),
            None => Ty::unit(),
        };

        Ty::Fn(FnTy {
            name: name.clone(),
            receiver,
            params,
            ret: Box::new(ret),
            own_params,
        })
    }
}
