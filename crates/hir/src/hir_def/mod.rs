//! The declaration store of one crate: traits, ADTs and impl blocks.

pub mod builder;
pub mod item;
pub mod path;
pub mod types;

use common::diagnostics::Span;
use cranelift_entity::{PrimaryMap, entity_impl};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use smol_str::SmolStr;

pub use builder::{FuncBuilder, HirIdAllocator, ImplBuilder, TraitBuilder};
pub use item::*;
pub use path::{CanonicalPath, CanonicalSegment, Namespace, TraitImplSegment};
pub use types::{AssocTypeBinding, GenericArg, GenericArgs, PathSegment, TypePath, TypeRef};

use crate::HirDb;

/// Identifies a named item (trait or ADT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(u32);
entity_impl!(DefId);

/// Identifies a node that can be assigned a type: generic parameters, trait
/// items and impl self types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HirId(u32);
entity_impl!(HirId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImplId(u32);
entity_impl!(ImplId);

#[derive(Debug)]
pub struct ItemTree {
    crate_name: SmolStr,
    items: PrimaryMap<DefId, Item>,
    impls: PrimaryMap<ImplId, ImplBlock>,
    by_name: FxHashMap<SmolStr, SmallVec<[DefId; 1]>>,
    by_path: FxHashMap<String, DefId>,
    hir_ids: HirIdAllocator,
}

impl ItemTree {
    pub fn new(crate_name: impl Into<SmolStr>) -> Self {
        Self {
            crate_name: crate_name.into(),
            items: PrimaryMap::new(),
            impls: PrimaryMap::new(),
            by_name: FxHashMap::default(),
            by_path: FxHashMap::default(),
            hir_ids: HirIdAllocator::default(),
        }
    }

    /// Declares a trait at `path` (`::`-separated, relative to the crate
    /// root). The implicit `Self` parameter is added before `build` runs.
    pub fn add_trait(&mut self, path: &str, build: impl FnOnce(&mut TraitBuilder)) -> DefId {
        let (module, name) = split_path(path);
        let def_id = self.items.next_key();
        let mut builder = TraitBuilder::new(&mut self.hir_ids, def_id, name, Span::default());
        build(&mut builder);
        let trait_ = builder.finish();
        self.insert(module, ItemKind::Trait(trait_))
    }

    /// Inserts an already built trait declaration. The caller is responsible
    /// for the implicit `Self` parameter.
    pub fn insert_trait(&mut self, path: &str, build: impl FnOnce(DefId, &mut HirIdAllocator) -> Trait) -> DefId {
        let (module, _) = split_path(path);
        let def_id = self.items.next_key();
        let trait_ = build(def_id, &mut self.hir_ids);
        self.insert(module, ItemKind::Trait(trait_))
    }

    pub fn add_struct(&mut self, path: &str, params: &[&str]) -> DefId {
        self.add_adt(path, AdtKind::Struct, params)
    }

    pub fn add_enum(&mut self, path: &str, params: &[&str]) -> DefId {
        self.add_adt(path, AdtKind::Enum, params)
    }

    fn add_adt(&mut self, path: &str, kind: AdtKind, params: &[&str]) -> DefId {
        let (module, name) = split_path(path);
        let def_id = self.items.next_key();
        let generic_params = params
            .iter()
            .map(|param| {
                GenericParam::Type(TypeParam {
                    hir_id: self.hir_ids.alloc(),
                    name: (*param).into(),
                    bounds: Vec::new(),
                    default: None,
                    span: Span::default(),
                })
            })
            .collect();
        let adt = AdtDef {
            def_id,
            name,
            kind,
            generic_params,
            span: Span::default(),
        };
        self.insert(module, ItemKind::Adt(adt))
    }

    pub fn add_impl(&mut self, self_ty: TypeRef, build: impl FnOnce(&mut ImplBuilder)) -> ImplId {
        let id = self.impls.next_key();
        let mut builder = ImplBuilder::new(&mut self.hir_ids, id, self_ty);
        build(&mut builder);
        self.impls.push(builder.finish())
    }

    fn insert(&mut self, module: SmallVec<[SmolStr; 2]>, kind: ItemKind) -> DefId {
        let item = Item { module, kind };
        let name = item.name().clone();
        let full_path = item
            .module
            .iter()
            .map(SmolStr::as_str)
            .chain(std::iter::once(name.as_str()))
            .collect::<Vec<_>>()
            .join("::");

        let def_id = self.items.push(item);
        self.by_name.entry(name).or_default().push(def_id);
        self.by_path.insert(full_path, def_id);
        def_id
    }

    pub fn impl_block(&self, id: ImplId) -> &ImplBlock {
        &self.impls[id]
    }
}

fn split_path(path: &str) -> (SmallVec<[SmolStr; 2]>, SmolStr) {
    let mut segments: SmallVec<[SmolStr; 2]> = path.split("::").map(SmolStr::new).collect();
    let name = segments.pop().unwrap_or_default();
    (segments, name)
}

impl HirDb for ItemTree {
    fn crate_name(&self) -> &str {
        &self.crate_name
    }

    fn items(&self) -> &PrimaryMap<DefId, Item> {
        &self.items
    }

    fn impl_blocks(&self) -> &PrimaryMap<ImplId, ImplBlock> {
        &self.impls
    }

    fn lookup_path(&self, path: &str) -> Option<DefId> {
        self.by_path.get(path).copied()
    }

    fn lookup_name(&self, name: &str) -> &[DefId] {
        self.by_name.get(name).map_or(&[], |defs| defs.as_slice())
    }
}
