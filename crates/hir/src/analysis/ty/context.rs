use std::rc::Rc;

use common::{
    config::AnalysisConfig,
    diagnostics::Span,
    indexmap::{IndexMap, IndexSet},
};
use rustc_hash::FxHashMap;
use tracing::trace;

use super::{
    bound::TypeBoundsMappings,
    diagnostics::TyDiag,
    subst::SubstitutionParamMapping,
    trait_def::TraitReference,
    ty_def::Ty,
};
use crate::{
    HirDb,
    hir_def::{DefId, HirId},
};

/// Resolution state of one trait declaration. Declarations that were never
/// requested have no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraitResolveState {
    /// Items are being built; the reference is not visible to lookups yet.
    Resolving,
    /// Visible in the cache with all items populated.
    Cached,
    /// Deferred checks of default bodies have run.
    BodiesResolved,
}

/// What a trait in the resolution stack is currently doing. Only a chain of
/// super-trait requests can form a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ResolvePhase {
    SuperTraits,
    Items,
}

/// Mutable state shared by every analysis of one crate: the trait cache, the
/// type table and the collected diagnostics.
#[derive(Debug)]
pub struct TypeCheckContext {
    trait_refs: IndexMap<DefId, Rc<TraitReference>>,
    trait_states: FxHashMap<DefId, TraitResolveState>,
    resolving: IndexMap<DefId, ResolvePhase>,
    /// Parameters of traits in `resolving` whose defaults are already lowered.
    pending_substs: FxHashMap<DefId, Vec<SubstitutionParamMapping>>,
    /// Object-safety checks of `dyn` types naming a trait that was still being
    /// resolved; they run once the trait is cached.
    deferred_object_safety: Vec<(DefId, Span)>,
    types: FxHashMap<HirId, Ty>,
    param_bounds: FxHashMap<HirId, TypeBoundsMappings>,
    diags: IndexSet<TyDiag>,
    error_trait: Rc<TraitReference>,
    recursion_limit: usize,
}

impl Default for TypeCheckContext {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl TypeCheckContext {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            trait_refs: IndexMap::new(),
            trait_states: FxHashMap::default(),
            resolving: IndexMap::new(),
            pending_substs: FxHashMap::default(),
            deferred_object_safety: Vec::new(),
            types: FxHashMap::default(),
            param_bounds: FxHashMap::default(),
            diags: IndexSet::new(),
            error_trait: Rc::new(TraitReference::error()),
            recursion_limit: config.recursion_limit,
        }
    }

    pub fn lookup_trait_reference(&self, def_id: DefId) -> Option<&Rc<TraitReference>> {
        self.trait_refs.get(&def_id)
    }

    pub fn trait_references(&self) -> impl Iterator<Item = &Rc<TraitReference>> {
        self.trait_refs.values()
    }

    pub fn trait_state(&self, def_id: DefId) -> Option<TraitResolveState> {
        self.trait_states.get(&def_id).copied()
    }

    pub fn error_trait(&self) -> Rc<TraitReference> {
        self.error_trait.clone()
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    pub fn insert_type(&mut self, hir_id: HirId, ty: Ty) {
        self.types.insert(hir_id, ty);
    }

    pub fn lookup_type(&self, hir_id: HirId) -> Option<&Ty> {
        self.types.get(&hir_id)
    }

    /// Bounds attached to a generic parameter type.
    pub fn bounds_of(&self, ty: &Ty) -> Option<&TypeBoundsMappings> {
        self.param_bounds.get(&ty.as_param()?.hir_id)
    }

    pub fn param_bounds(&self, hir_id: HirId) -> Option<&TypeBoundsMappings> {
        self.param_bounds.get(&hir_id)
    }

    pub(crate) fn inherit_bounds(&mut self, hir_id: HirId, bounds: TypeBoundsMappings) {
        let entry = self.param_bounds.entry(hir_id).or_default();
        for bound in bounds.into_specified_bounds() {
            entry.add_bound(bound);
        }
    }

    pub fn push_diag(&mut self, diag: TyDiag) {
        self.diags.insert(diag);
    }

    pub fn diags(&self) -> impl Iterator<Item = &TyDiag> {
        self.diags.iter()
    }

    pub fn take_diags(&mut self) -> Vec<TyDiag> {
        std::mem::take(&mut self.diags).into_iter().collect()
    }

    pub(crate) fn is_resolving(&self, def_id: DefId) -> bool {
        self.resolving.contains_key(&def_id)
    }

    pub(crate) fn resolving_depth(&self) -> usize {
        self.resolving.len()
    }

    pub(crate) fn begin_resolving(&mut self, def_id: DefId) {
        self.resolving.insert(def_id, ResolvePhase::SuperTraits);
        self.trait_states.insert(def_id, TraitResolveState::Resolving);
    }

    pub(crate) fn set_phase(&mut self, def_id: DefId, phase: ResolvePhase) {
        if let Some(current) = self.resolving.get_mut(&def_id) {
            *current = phase;
        }
    }

    /// Returns the traits forming a super-trait cycle through `def_id`, or
    /// `None` if some trait on the way is past its super-traits.
    pub(crate) fn super_trait_cycle(&self, def_id: DefId) -> Option<Vec<DefId>> {
        let start = self.resolving.get_index_of(&def_id)?;
        let chain = &self.resolving.as_slice()[start..];
        chain
            .values()
            .all(|phase| *phase == ResolvePhase::SuperTraits)
            .then(|| chain.keys().copied().chain(std::iter::once(def_id)).collect())
    }

    pub(crate) fn set_pending_substs(&mut self, def_id: DefId, substs: Vec<SubstitutionParamMapping>) {
        self.pending_substs.insert(def_id, substs);
    }

    pub(crate) fn pending_substs(&self, def_id: DefId) -> Option<&[SubstitutionParamMapping]> {
        self.pending_substs.get(&def_id).map(Vec::as_slice)
    }

    pub(crate) fn insert_trait_reference(&mut self, def_id: DefId, trait_ref: TraitReference) {
        self.resolving.shift_remove(&def_id);
        self.pending_substs.remove(&def_id);
        self.trait_refs.insert(def_id, Rc::new(trait_ref));
        self.trait_states.insert(def_id, TraitResolveState::Cached);
        trace!(?def_id, "trait reference cached");
    }

    pub(crate) fn mark_bodies_resolved(&mut self, def_id: DefId) {
        self.trait_states
            .insert(def_id, TraitResolveState::BodiesResolved);
    }

    pub(crate) fn defer_object_safety(&mut self, def_id: DefId, span: Span) {
        self.deferred_object_safety.push((def_id, span));
    }

    pub(crate) fn take_deferred_object_safety(&mut self, def_id: DefId) -> Vec<Span> {
        let mut spans = Vec::new();
        self.deferred_object_safety.retain(|(deferred, span)| {
            if *deferred == def_id {
                spans.push(*span);
                false
            } else {
                true
            }
        });
        spans
    }
}

/// The analysis entry point: read-only declarations plus the mutable
/// [`TypeCheckContext`].
pub struct TyCtxt<'db, 'cx> {
    pub db: &'db dyn HirDb,
    pub cx: &'cx mut TypeCheckContext,
}

impl<'db, 'cx> TyCtxt<'db, 'cx> {
    pub fn new(db: &'db dyn HirDb, cx: &'cx mut TypeCheckContext) -> Self {
        Self { db, cx }
    }

    pub(crate) fn trait_name(&self, def_id: DefId) -> smol_str::SmolStr {
        self.db
            .trait_def(def_id)
            .map_or_else(|| "<unknown>".into(), |trait_| trait_.name.clone())
    }
}
