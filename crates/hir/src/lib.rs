pub mod analysis;
pub mod hir_def;

use cranelift_entity::PrimaryMap;
use hir_def::{AdtDef, CanonicalPath, DefId, ImplBlock, ImplId, Item, ItemKind, Namespace, Trait};

/// Read access to the declarations of one crate.
pub trait HirDb {
    fn crate_name(&self) -> &str;

    fn items(&self) -> &PrimaryMap<DefId, Item>;

    fn impl_blocks(&self) -> &PrimaryMap<ImplId, ImplBlock>;

    /// Looks up an item by its `::`-separated path relative to the crate root.
    fn lookup_path(&self, path: &str) -> Option<DefId>;

    /// All items whose own name is `name`, in declaration order.
    fn lookup_name(&self, name: &str) -> &[DefId];

    fn item(&self, def: DefId) -> Option<&Item> {
        self.items().get(def)
    }

    fn trait_def(&self, def: DefId) -> Option<&Trait> {
        match &self.item(def)?.kind {
            ItemKind::Trait(trait_) => Some(trait_),
            ItemKind::Adt(_) => None,
        }
    }

    fn adt_def(&self, def: DefId) -> Option<&AdtDef> {
        match &self.item(def)?.kind {
            ItemKind::Adt(adt) => Some(adt),
            ItemKind::Trait(_) => None,
        }
    }

    fn canonical_path(&self, def: DefId) -> Option<CanonicalPath> {
        let item = self.item(def)?;
        let path = item
            .module
            .iter()
            .fold(CanonicalPath::crate_root(self.crate_name()), |path, module| {
                path.join(module.clone(), Namespace::Type)
            });
        Some(path.join(item.name().clone(), Namespace::Type))
    }
}
