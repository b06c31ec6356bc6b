//! This module implements trait resolution: turning a trait declaration into
//! a cached [`TraitReference`], and trait bounds into
//! [`TypeBoundPredicate`]s.

use std::{fmt, rc::Rc};

use common::diagnostics::Span;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use super::{
    bound::{AppliedArgs, TypeBoundPredicate, TypeBoundsMappings},
    context::{ResolvePhase, TyCtxt},
    diagnostics::TraitLowerDiag,
    subst::SubstitutionParamMapping,
    trait_def::TraitReference,
    ty_def::{ParamTy, Ty},
    ty_lower::GenericScope,
};
use crate::{
    analysis::name_resolution::resolve_trait_path,
    hir_def::{
        Body, BodyUse, DefId, GenericParam, SELF_PARAM, Trait, TraitItemKind, TypeBound, TypeParam,
        TypePath,
    },
};

/// Generic arguments that do not fit a trait's parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraitArgError {
    ArgNumMismatch {
        expected: usize,
        given: usize,
    },
    /// A lifetime argument written after a type argument.
    ArgKindMisMatch {
        lifetime: SmolStr,
    },
}

impl fmt::Display for TraitArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArgNumMismatch { expected, given } => {
                write!(f, "expected {expected} generic arguments, but {given} given")
            }
            Self::ArgKindMisMatch { lifetime } => {
                write!(f, "lifetime argument `'{lifetime}` must precede type arguments")
            }
        }
    }
}

impl std::error::Error for TraitArgError {}

impl<'db> TyCtxt<'db, '_> {
    /// Resolves `path` to a trait and returns its cached reference, building
    /// it first if needed. Failures are reported and yield the error
    /// reference.
    pub fn resolve_trait(&mut self, path: &TypePath) -> Rc<TraitReference> {
        match resolve_trait_path(self.db, path) {
            Ok(def_id) => self.resolve_trait_def(def_id, path.span),
            Err(diag) => {
                self.cx.push_diag(diag.into());
                self.cx.error_trait()
            }
        }
    }

    /// Like [`TyCtxt::resolve_trait`], but never builds anything: a trait
    /// that is not cached yet yields the error reference.
    pub fn lookup_trait(&mut self, path: &TypePath) -> Rc<TraitReference> {
        match resolve_trait_path(self.db, path) {
            Ok(def_id) => self
                .cx
                .lookup_trait_reference(def_id)
                .cloned()
                .unwrap_or_else(|| self.cx.error_trait()),
            Err(diag) => {
                self.cx.push_diag(diag.into());
                self.cx.error_trait()
            }
        }
    }

    pub fn resolve_trait_def(&mut self, def_id: DefId, span: Span) -> Rc<TraitReference> {
        if let Some(cached) = self.cx.lookup_trait_reference(def_id) {
            trace!(?def_id, "trait cache hit");
            return cached.clone();
        }

        let db = self.db;
        let Some(trait_) = db.trait_def(def_id) else {
            return self.cx.error_trait();
        };

        if self.cx.is_resolving(def_id) {
            trace!(trait_name = %trait_.name, "trait is still being resolved");
            return self.cx.error_trait();
        }

        let limit = self.cx.recursion_limit();
        if self.cx.resolving_depth() >= limit {
            self.cx.push_diag(
                TraitLowerDiag::RecursionLimitReached {
                    span,
                    trait_name: trait_.name.clone(),
                    limit,
                }
                .into(),
            );
            return self.cx.error_trait();
        }

        debug!(trait_name = %trait_.name, "resolving trait");
        self.cx.begin_resolving(def_id);
        let trait_ref = self.build_trait_reference(trait_);
        self.cx.insert_trait_reference(def_id, trait_ref);

        self.on_resolved(def_id);
        self.cx
            .lookup_trait_reference(def_id)
            .cloned()
            .unwrap_or_else(|| self.cx.error_trait())
    }

    fn build_trait_reference(&mut self, trait_: &'db Trait) -> TraitReference {
        let def_id = trait_.def_id;

        let mut substitutions: Vec<SubstitutionParamMapping> = trait_
            .type_params()
            .map(|param| {
                SubstitutionParamMapping::new(
                    ParamTy::new(param.hir_id, param.name.clone()),
                    None,
                    param.span,
                )
            })
            .collect();
        trace!(params = substitutions.len(), "collected trait parameters");

        let Some(self_idx) = substitutions
            .iter()
            .position(|mapping| mapping.param().name == SELF_PARAM)
        else {
            unreachable!("trait `{}` has no implicit `Self` parameter", trait_.name);
        };
        substitutions[..=self_idx].rotate_right(1);

        for mapping in &substitutions {
            self.cx.insert_type(mapping.param().hir_id, mapping.param_ty());
        }
        let scope = GenericScope::from_params(substitutions.iter().map(|mapping| mapping.param().clone()));

        let declared: FxHashMap<_, _> = trait_
            .type_params()
            .map(|param| (param.hir_id, param))
            .collect();
        for idx in 0..substitutions.len() {
            let hir_id = substitutions[idx].param().hir_id;
            if let Some(default) = declared.get(&hir_id).and_then(|param| param.default.as_ref()) {
                let default = self.lower_ty(default, &scope);
                substitutions[idx].set_default(default);
            }
        }
        self.cx.set_pending_substs(def_id, substitutions.clone());

        // The trait itself comes first among the receiver's bounds, built from
        // the raw declaration because it is not cached yet.
        let self_param = substitutions[0].param().clone();
        let self_ty = Ty::Param(self_param.clone());
        let mut receiver_bounds = TypeBoundsMappings::default();
        let mut self_bound = TypeBoundPredicate::from_raw(def_id, substitutions.clone(), trait_.span);
        self_bound.bind_receiver(self_ty.clone());
        receiver_bounds.add_bound(self_bound);

        let self_decl = declared.get(&self_param.hir_id);
        let super_trait_paths = trait_
            .super_traits
            .iter()
            .chain(self_decl.into_iter().flat_map(|param| param.bounds.iter()))
            .filter_map(|bound| match bound {
                TypeBound::Trait(path) => Some(path),
                TypeBound::Lifetime(_) => None,
            });

        let mut super_traits = Vec::new();
        for path in super_trait_paths {
            let mut predicate = self.predicate_from_bound(path, &scope, true);
            if predicate.has_error_flag() {
                continue;
            }
            predicate.bind_receiver(self_ty.clone());
            debug!(trait_name = %trait_.name, super_trait = %path, "resolved super-trait");
            receiver_bounds.add_bound(predicate.clone());
            super_traits.push(predicate);
        }
        self.cx.inherit_bounds(self_param.hir_id, receiver_bounds);
        self.cx.set_phase(def_id, ResolvePhase::Items);

        for param in trait_.type_params().filter(|param| param.hir_id != self_param.hir_id) {
            self.lower_param_bounds(param, &scope);
        }

        let mut seen: FxHashMap<&SmolStr, Span> = FxHashMap::default();
        let mut items = Vec::with_capacity(trait_.items.len());
        for item in &trait_.items {
            if let Some(first) = seen.get(&item.name) {
                self.cx.push_diag(
                    TraitLowerDiag::DuplicateTraitItem {
                        trait_name: trait_.name.clone(),
                        name: item.name.clone(),
                        first: *first,
                        duplicate: item.span,
                    }
                    .into(),
                );
                continue;
            }
            seen.insert(&item.name, item.span);
            items.push(self.resolve_trait_item(def_id, item, &self_ty, &substitutions, &scope));
        }

        TraitReference::new(
            def_id,
            trait_.name.clone(),
            trait_.span,
            items,
            super_traits,
            substitutions,
        )
    }

    /// Deferred work that needs the trait to be visible in the cache.
    fn on_resolved(&mut self, def_id: DefId) {
        let Some(trait_ref) = self.cx.lookup_trait_reference(def_id).cloned() else {
            return;
        };

        for span in self.cx.take_deferred_object_safety(def_id) {
            trait_ref.is_object_safe(self.cx, true, span);
        }

        let db = self.db;
        if let Some(trait_) = db.trait_def(def_id) {
            let scope =
                GenericScope::from_params(trait_ref.trait_substs().iter().map(|mapping| mapping.param().clone()));
            for item in &trait_.items {
                let Some(body) = item.kind.default_body() else {
                    continue;
                };
                let mut scope = scope.clone();
                if let TraitItemKind::Func(func) = &item.kind {
                    for param in func.generic_params.iter().filter_map(GenericParam::as_type) {
                        scope.push(ParamTy::new(param.hir_id, param.name.clone()));
                    }
                }
                trace!(item = %item.name, "checking default body");
                self.check_body(body, &scope);
            }
        }

        self.cx.mark_bodies_resolved(def_id);
    }

    fn check_body(&mut self, body: &Body, scope: &GenericScope) {
        for body_use in &body.uses {
            match body_use {
                BodyUse::Bound(path) => {
                    self.predicate_from_bound(path, scope, false);
                }
                BodyUse::AssocItem { trait_path, item } => {
                    let predicate = self.predicate_from_bound(trait_path, scope, false);
                    if !predicate.is_error(self.cx) && !predicate.contains_item(self.cx, item) {
                        let trait_name = predicate
                            .trait_id()
                            .map_or_else(SmolStr::default, |def_id| self.trait_name(def_id));
                        self.cx.push_diag(
                            TraitLowerDiag::UnknownTraitItem {
                                span: trait_path.span,
                                trait_name,
                                name: item.clone(),
                            }
                            .into(),
                        );
                    }
                }
            }
        }
    }

    /// Lowers the bounds written on `param` and attaches them to it.
    pub(crate) fn lower_param_bounds(&mut self, param: &TypeParam, scope: &GenericScope) {
        let param_ty = Ty::param(param.hir_id, param.name.clone());
        let mut bounds = TypeBoundsMappings::default();
        for bound in &param.bounds {
            let TypeBound::Trait(path) = bound else {
                continue;
            };
            let mut predicate = self.predicate_from_bound(path, scope, false);
            if predicate.has_error_flag() {
                continue;
            }
            predicate.bind_receiver(param_ty.clone());
            bounds.add_bound(predicate);
        }
        self.cx.inherit_bounds(param.hir_id, bounds);
    }

    /// Builds the predicate for a bound such as `T: Add<u32, Output = u32>`.
    ///
    /// A bound naming a trait that is still being resolved yields a predicate
    /// over the trait's raw parameters; it becomes usable once the trait is
    /// cached. `is_super_trait` marks bounds on a trait's own receiver, which
    /// are the only ones that can form a cycle.
    pub fn predicate_from_bound(
        &mut self,
        path: &TypePath,
        scope: &GenericScope,
        is_super_trait: bool,
    ) -> TypeBoundPredicate {
        let db = self.db;
        let def_id = match resolve_trait_path(db, path) {
            Ok(def_id) => def_id,
            Err(diag) => {
                self.cx.push_diag(diag.into());
                return TypeBoundPredicate::error();
            }
        };

        let mut predicate = if self.cx.is_resolving(def_id) {
            if is_super_trait && let Some(cycle) = self.cx.super_trait_cycle(def_id) {
                let cycle = cycle.into_iter().map(|def_id| self.trait_name(def_id)).collect();
                self.cx.push_diag(
                    TraitLowerDiag::CyclicSuperTraits {
                        span: path.span,
                        cycle,
                    }
                    .into(),
                );
                return TypeBoundPredicate::error();
            }

            trace!(bound = %path, "bound names a trait that is being resolved");
            let substs = match self.cx.pending_substs(def_id) {
                Some(substs) => substs.to_vec(),
                None => match db.trait_def(def_id) {
                    Some(trait_) => raw_trait_substs(trait_),
                    None => return TypeBoundPredicate::error(),
                },
            };
            TypeBoundPredicate::from_raw(def_id, substs, path.span)
        } else {
            let trait_ref = self.resolve_trait_def(def_id, path.span);
            if trait_ref.is_error() {
                return TypeBoundPredicate::error();
            }
            TypeBoundPredicate::new(&trait_ref, path.span)
        };

        let applied = match path.generic_args() {
            Some(args) => self.lower_generic_args(args, scope),
            None => AppliedArgs::new(path.span),
        };
        if predicate.substitutions().len() > 1 || !applied.is_empty() {
            if let Err(err) = predicate.apply_generic_arguments(&applied) {
                let trait_name = self.trait_name(def_id);
                self.cx
                    .push_diag(TraitLowerDiag::from_arg_error(err, applied.span, trait_name).into());
                return predicate;
            }
        }

        if let Some(trait_) = db.trait_def(def_id) {
            for (name, _) in predicate.assoc_type_bindings() {
                let declared = trait_
                    .item(name)
                    .is_some_and(|item| matches!(item.kind, TraitItemKind::Type { .. }));
                if !declared {
                    self.cx.push_diag(
                        TraitLowerDiag::UnknownAssocBinding {
                            span: applied.span,
                            trait_name: trait_.name.clone(),
                            name: name.clone(),
                        }
                        .into(),
                    );
                }
            }
        }

        predicate
    }
}

/// Parameters of a trait straight from its declaration, without defaults.
fn raw_trait_substs(trait_: &Trait) -> Vec<SubstitutionParamMapping> {
    let mut substs: Vec<_> = trait_
        .type_params()
        .map(|param| {
            SubstitutionParamMapping::new(
                ParamTy::new(param.hir_id, param.name.clone()),
                None,
                param.span,
            )
        })
        .collect();
    if let Some(self_idx) = substs.iter().position(SubstitutionParamMapping::is_receiver) {
        substs[..=self_idx].rotate_right(1);
    }
    substs
}
