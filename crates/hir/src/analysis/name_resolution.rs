use std::fmt;

use smallvec::SmallVec;

use super::ty::diagnostics::PathResDiag;
use crate::{
    HirDb,
    hir_def::{DefId, ItemKind, TypePath},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResError {
    NotFound,
    /// The bare name matches several items.
    Ambiguous(Vec<DefId>),
}

impl fmt::Display for PathResError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "path not found"),
            Self::Ambiguous(defs) => write!(f, "path is ambiguous between {} items", defs.len()),
        }
    }
}

impl std::error::Error for PathResError {}

impl PathResError {
    pub fn into_diag(self, db: &dyn HirDb, path: &TypePath) -> PathResDiag {
        match self {
            Self::NotFound => PathResDiag::NotFound {
                span: path.span,
                path: path.plain(),
            },
            Self::Ambiguous(defs) => PathResDiag::Ambiguous {
                span: path.span,
                path: path.plain(),
                candidates: defs
                    .into_iter()
                    .filter_map(|def| db.canonical_path(def))
                    .map(|path| path.to_string())
                    .collect(),
            },
        }
    }
}

/// Resolves a type-namespace path to an item.
///
/// Paths may start with `crate` or the crate's own name. A path relative to the
/// crate root wins; a single segment that names no root item falls back to any
/// item with that name, which is an error if there is more than one.
pub fn resolve_path(db: &dyn HirDb, path: &TypePath) -> Result<DefId, PathResError> {
    let segments: SmallVec<[&str; 4]> = path.segments.iter().map(|seg| seg.ident.as_str()).collect();
    let relative = match segments.as_slice() {
        ["crate", rest @ ..] => rest,
        [first, rest @ ..] if *first == db.crate_name() && !rest.is_empty() => rest,
        all => all,
    };

    if let Some(def) = db.lookup_path(&relative.join("::")) {
        return Ok(def);
    }

    match relative {
        [name] => match db.lookup_name(name) {
            [] => Err(PathResError::NotFound),
            [def] => Ok(*def),
            defs => Err(PathResError::Ambiguous(defs.to_vec())),
        },
        _ => Err(PathResError::NotFound),
    }
}

/// Resolves `path` and checks that it names a trait.
pub fn resolve_trait_path(db: &dyn HirDb, path: &TypePath) -> Result<DefId, PathResDiag> {
    let def = resolve_path(db, path).map_err(|err| err.into_diag(db, path))?;
    match db.item(def).map(|item| (&item.kind, item.kind_name())) {
        Some((ItemKind::Trait(_), _)) => Ok(def),
        Some((ItemKind::Adt(_), found)) => Err(PathResDiag::ExpectedTrait {
            span: path.span,
            path: path.plain(),
            found,
        }),
        None => Err(PathResDiag::NotFound {
            span: path.span,
            path: path.plain(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir_def::ItemTree;

    #[test]
    fn root_items_shadow_nested_names() {
        let mut tree = ItemTree::new("example");
        let nested = tree.add_trait("fmt::Display", |_| {});
        assert_eq!(resolve_path(&tree, &TypePath::parse("Display")), Ok(nested));

        let root = tree.add_trait("Display", |_| {});
        assert_eq!(resolve_path(&tree, &TypePath::parse("Display")), Ok(root));
        assert_eq!(
            resolve_path(&tree, &TypePath::parse("example::fmt::Display")),
            Ok(nested)
        );
        assert_eq!(
            resolve_path(&tree, &TypePath::parse("crate::Display")),
            Ok(root)
        );
    }

    #[test]
    fn ambiguous_and_missing() {
        let mut tree = ItemTree::new("example");
        let a = tree.add_trait("a::Show", |_| {});
        let b = tree.add_trait("b::Show", |_| {});
        assert_eq!(
            resolve_path(&tree, &TypePath::parse("Show")),
            Err(PathResError::Ambiguous(vec![a, b]))
        );
        assert_eq!(
            resolve_path(&tree, &TypePath::parse("c::Show")),
            Err(PathResError::NotFound)
        );
    }

    #[test]
    fn struct_is_not_a_trait() {
        let mut tree = ItemTree::new("example");
        tree.add_struct("Point", &[]);
        let err = resolve_trait_path(&tree, &TypePath::parse("Point")).unwrap_err();
        assert!(matches!(err, PathResDiag::ExpectedTrait { found: "struct", .. }));
    }
}
