//! Finding the traits a concrete type implements.

use std::rc::Rc;

use tracing::{debug, trace};

use super::{context::TyCtxt, trait_def::TraitReference, ty_def::Ty};
use crate::hir_def::ImplBlock;

impl<'db> TyCtxt<'db, '_> {
    /// Scans every trait impl whose self type is compatible with `receiver` in
    /// either direction and returns the implemented traits in impl order.
    ///
    /// Impl self types are read from the type table, so impl headers must be
    /// lowered first. Impls whose trait does not resolve are skipped.
    pub fn probe_type_bounds(&mut self, receiver: &Ty) -> Vec<(Rc<TraitReference>, &'db ImplBlock)> {
        let db = self.db;
        let mut found = Vec::new();

        for (_, impl_) in db.impl_blocks().iter() {
            let Some(trait_path) = &impl_.trait_ref else {
                continue;
            };
            let Some(impl_ty) = self.cx.lookup_type(impl_.self_ty_hir_id) else {
                trace!(impl_id = ?impl_.id, "impl header is not lowered");
                continue;
            };
            if !(receiver.can_eq(impl_ty, false) || impl_ty.can_eq(receiver, false)) {
                continue;
            }

            let trait_ref = self.resolve_trait(trait_path);
            if trait_ref.is_error() {
                continue;
            }
            debug!(%receiver, trait_name = %trait_ref.name(), "probe candidate");
            found.push((trait_ref, impl_));
        }

        found
    }
}
