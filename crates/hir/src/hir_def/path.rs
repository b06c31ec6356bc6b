use std::fmt;

use smol_str::SmolStr;

use crate::analysis::ty::ty_def::Ty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Type,
    Value,
}

/// A fully qualified path identifying a declaration, e.g.
/// `example::fmt::Display`. This is the input of symbol mangling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath {
    pub crate_name: SmolStr,
    pub crate_disambiguator: u64,
    pub segments: Vec<CanonicalSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalSegment {
    pub name: SmolStr,
    pub ns: Namespace,
    /// Distinguishes items that share a name in the same parent; `0` for none.
    pub disambiguator: u64,
    pub generic_args: Vec<Ty>,
    /// Set when the segment is `<SelfTy as Trait>`; `name` keeps its text.
    pub trait_impl: Option<Box<TraitImplSegment>>,
}

/// The parent of the items of a trait implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraitImplSegment {
    pub self_ty: Ty,
    /// The trait's own path, with its non-receiver arguments on the last
    /// segment.
    pub trait_path: CanonicalPath,
}

impl CanonicalPath {
    pub fn crate_root(crate_name: impl Into<SmolStr>) -> Self {
        Self {
            crate_name: crate_name.into(),
            crate_disambiguator: 0,
            segments: Vec::new(),
        }
    }

    pub fn with_crate_disambiguator(mut self, disambiguator: u64) -> Self {
        self.crate_disambiguator = disambiguator;
        self
    }

    pub fn join(mut self, name: impl Into<SmolStr>, ns: Namespace) -> Self {
        self.segments.push(CanonicalSegment {
            name: name.into(),
            ns,
            disambiguator: 0,
            generic_args: Vec::new(),
            trait_impl: None,
        });
        self
    }

    /// Appends `<self_ty as trait_path>` in the type namespace.
    pub fn join_trait_impl(mut self, self_ty: Ty, trait_path: CanonicalPath) -> Self {
        self.segments.push(CanonicalSegment {
            name: format!("<{self_ty} as {trait_path}>").into(),
            ns: Namespace::Type,
            disambiguator: 0,
            generic_args: Vec::new(),
            trait_impl: Some(Box::new(TraitImplSegment {
                self_ty,
                trait_path,
            })),
        });
        self
    }

    /// Sets the generic arguments of the last segment.
    pub fn with_generic_args(mut self, args: Vec<Ty>) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.generic_args = args;
        }
        self
    }

    pub fn with_disambiguator(mut self, disambiguator: u64) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.disambiguator = disambiguator;
        }
        self
    }

    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map_or(self.crate_name.as_str(), |seg| seg.name.as_str())
    }

    pub fn is_crate_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.crate_name)?;
        for seg in &self.segments {
            write!(f, "::{seg}")?;
        }
        Ok(())
    }
}

impl fmt::Display for CanonicalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.generic_args.is_empty() {
            let args = self
                .generic_args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "<{args}>")?;
        }
        Ok(())
    }
}
