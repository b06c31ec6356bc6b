//! Linker symbols for resolved items.
//!
//! Two schemes are available behind [`ManglingVersion`]: the legacy
//! `_ZN...E` scheme, which escapes every path segment and appends a hash of
//! the item's type, and the `_R` v0 scheme, which encodes the path
//! structurally.

mod legacy;
mod punycode;
mod v0;

use std::fmt;

pub use common::config::ManglingVersion;
use hir::{HirDb, analysis::ty::ty_def::Ty, hir_def::CanonicalPath};
use smol_str::SmolStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mangler {
    version: ManglingVersion,
}

impl Mangler {
    pub fn new(version: ManglingVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> ManglingVersion {
        self.version
    }

    /// Produces the symbol of the item at `path` whose resolved type is `ty`.
    pub fn mangle_item(
        &self,
        db: &dyn HirDb,
        ty: &Ty,
        path: &CanonicalPath,
    ) -> Result<String, MangleError> {
        if ty.has_error() {
            return Err(MangleError::ErrorType {
                path: path.to_string(),
            });
        }

        let symbol = match self.version {
            ManglingVersion::Legacy => legacy::mangle_item(ty, path)?,
            ManglingVersion::V0 => v0::mangle_item(db, path)?,
        };
        debug!(%path, %ty, %symbol, version = ?self.version, "mangled item");
        Ok(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MangleError {
    /// A single `:` inside a path segment.
    UnpairedColon { segment: SmolStr },
    /// The item's type did not resolve.
    ErrorType { path: String },
    /// An ADT or trait named by a type has no canonical path.
    UnknownDefinition { name: SmolStr },
    /// The identifier cannot be punycode encoded.
    Punycode { identifier: SmolStr },
    /// The identifier is empty or holds characters other than `[A-Za-z0-9_]`
    /// once encoded.
    InvalidIdentifier { identifier: SmolStr },
}

impl fmt::Display for MangleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnpairedColon { segment } => {
                write!(f, "unpaired `:` in path segment `{segment}`")
            }
            Self::ErrorType { path } => {
                write!(f, "cannot mangle `{path}`: its type contains errors")
            }
            Self::UnknownDefinition { name } => {
                write!(f, "`{name}` has no canonical path")
            }
            Self::Punycode { identifier } => {
                write!(f, "identifier `{identifier}` cannot be punycode encoded")
            }
            Self::InvalidIdentifier { identifier } => {
                write!(f, "`{identifier}` is not a valid symbol identifier")
            }
        }
    }
}

impl std::error::Error for MangleError {}
