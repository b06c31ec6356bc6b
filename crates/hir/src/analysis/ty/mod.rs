use tracing::debug;

use crate::analysis::analysis_pass::ModuleAnalysisPass;
use context::TyCtxt;

pub mod bound;
pub mod context;
pub mod diagnostics;
pub mod fold;
pub mod impl_check;
pub mod probe;
pub mod subst;
pub mod trait_def;
pub mod trait_item;
pub mod trait_lower;
pub mod ty_def;
pub mod ty_lower;
pub mod unify;

/// Lowers every impl header so that impl self types are known to later
/// passes.
pub struct ImplHeaderPass {}

impl ModuleAnalysisPass for ImplHeaderPass {
    fn run_on_module(&mut self, tcx: &mut TyCtxt<'_, '_>) {
        let db = tcx.db;
        for (_, impl_) in db.impl_blocks().iter() {
            tcx.lower_impl_header(impl_);
        }
    }
}

/// An analysis pass for trait definitions.
pub struct TraitAnalysisPass {}

impl ModuleAnalysisPass for TraitAnalysisPass {
    fn run_on_module(&mut self, tcx: &mut TyCtxt<'_, '_>) {
        let db = tcx.db;
        for (def_id, item) in db.items().iter() {
            if db.trait_def(def_id).is_some() {
                debug!(trait_name = %item.name(), "analyzing trait");
                tcx.resolve_trait_def(def_id, item.span());
            }
        }
    }
}

pub struct ImplAnalysisPass {}

impl ModuleAnalysisPass for ImplAnalysisPass {
    fn run_on_module(&mut self, tcx: &mut TyCtxt<'_, '_>) {
        let db = tcx.db;
        for (_, impl_) in db.impl_blocks().iter() {
            tcx.check_impl_trait(impl_);
        }
    }
}
