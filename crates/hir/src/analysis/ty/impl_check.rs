use smol_str::SmolStr;

use super::{context::TyCtxt, diagnostics::ImplDiag, ty_def::Ty, ty_lower::GenericScope};
use crate::hir_def::ImplBlock;

impl<'db> TyCtxt<'db, '_> {
    /// Lowers the impl's generic parameters and self type, and records the
    /// self type in the type table.
    pub fn lower_impl_header(&mut self, impl_: &ImplBlock) -> Ty {
        let mut scope = GenericScope::default();
        self.lower_generic_params(&impl_.generic_params, &mut scope);
        let self_ty = self.lower_ty(&impl_.self_ty, &scope);
        self.cx.insert_type(impl_.self_ty_hir_id, self_ty.clone());
        self_ty
    }

    /// Checks a trait impl against its trait: every required item is
    /// provided and every provided item belongs to the trait.
    pub fn check_impl_trait(&mut self, impl_: &ImplBlock) {
        let Some(trait_path) = &impl_.trait_ref else {
            return;
        };

        let self_ty = match self.cx.lookup_type(impl_.self_ty_hir_id) {
            Some(ty) => ty.clone(),
            None => self.lower_impl_header(impl_),
        };
        let scope = GenericScope::from_params(
            impl_
                .generic_params
                .iter()
                .filter_map(|param| param.as_type())
                .filter_map(|param| self.cx.lookup_type(param.hir_id)?.as_param().cloned()),
        );

        let mut predicate = self.predicate_from_bound(trait_path, &scope, false);
        if predicate.is_error(self.cx) {
            return;
        }
        predicate.bind_receiver(self_ty);
        let Some(trait_ref) = predicate.get(self.cx).cloned() else {
            return;
        };

        let missing: Vec<SmolStr> = trait_ref
            .items()
            .iter()
            .filter(|item| impl_.item(item.identifier()).is_none())
            .filter(|item| {
                predicate
                    .lookup_associated_item(self.cx, item.identifier())
                    .needs_implementation()
            })
            .map(|item| item.identifier().clone())
            .collect();
        if !missing.is_empty() {
            self.cx.push_diag(
                ImplDiag::MissingTraitItems {
                    span: impl_.span,
                    trait_name: trait_ref.name().clone(),
                    missing,
                }
                .into(),
            );
        }

        for item in &impl_.items {
            if !predicate.contains_item(self.cx, &item.name) {
                self.cx.push_diag(
                    ImplDiag::NotATraitMember {
                        span: item.span,
                        trait_name: trait_ref.name().clone(),
                        name: item.name.clone(),
                    }
                    .into(),
                );
            }
        }
    }
}
