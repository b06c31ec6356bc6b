use tracing::debug;

use super::{
    diagnostics::DiagnosticVoucher,
    ty::{
        ImplAnalysisPass, ImplHeaderPass, TraitAnalysisPass,
        context::{TyCtxt, TypeCheckContext},
    },
};
use crate::HirDb;

/// All analysis passes that run analysis on the whole crate should implement
/// this trait. Passes report through the context's diagnostic sink.
pub trait ModuleAnalysisPass {
    fn run_on_module(&mut self, tcx: &mut TyCtxt<'_, '_>);
}

#[derive(Default)]
pub struct AnalysisPassManager {
    module_passes: Vec<Box<dyn ModuleAnalysisPass>>,
}

impl AnalysisPassManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module_pass(&mut self, pass: Box<dyn ModuleAnalysisPass>) {
        self.module_passes.push(pass);
    }

    /// Runs every pass in insertion order and returns the diagnostics they
    /// reported, pass by pass.
    pub fn run_on_module(
        &mut self,
        db: &dyn HirDb,
        cx: &mut TypeCheckContext,
    ) -> Vec<Box<dyn DiagnosticVoucher>> {
        let mut diags: Vec<Box<dyn DiagnosticVoucher>> = vec![];
        let mut tcx = TyCtxt::new(db, cx);
        for (idx, pass) in self.module_passes.iter_mut().enumerate() {
            pass.run_on_module(&mut tcx);
            let reported = tcx.cx.take_diags();
            debug!(pass = idx, diags = reported.len(), "analysis pass finished");
            diags.extend(reported.into_iter().map(|diag| Box::new(diag) as _));
        }
        diags
    }
}

/// The default pass pipeline: impl headers, then traits, then impls.
pub fn initialize_analysis_pass() -> AnalysisPassManager {
    let mut pass_manager = AnalysisPassManager::new();
    pass_manager.add_module_pass(Box::new(ImplHeaderPass {}));
    pass_manager.add_module_pass(Box::new(TraitAnalysisPass {}));
    pass_manager.add_module_pass(Box::new(ImplAnalysisPass {}));
    pass_manager
}
