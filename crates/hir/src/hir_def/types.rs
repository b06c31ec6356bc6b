use std::fmt;

use common::diagnostics::Span;
use smallvec::SmallVec;
use smol_str::SmolStr;

/// A type expression as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Path(TypePath),
    Ref { mutable: bool, inner: Box<TypeRef> },
    Ptr { mutable: bool, inner: Box<TypeRef> },
    Tuple(Vec<TypeRef>),
    Array { elem: Box<TypeRef>, len: u64 },
    Slice(Box<TypeRef>),
    /// `dyn A + B`.
    TraitObject(Vec<TypePath>),
    Never,
    /// `_`
    Infer,
}

impl TypeRef {
    pub fn path(path: &str) -> Self {
        Self::Path(TypePath::parse(path))
    }

    pub fn self_ty() -> Self {
        Self::path("Self")
    }

    pub fn unit() -> Self {
        Self::Tuple(Vec::new())
    }

    pub fn reference(inner: TypeRef) -> Self {
        Self::Ref {
            mutable: false,
            inner: Box::new(inner),
        }
    }

    pub fn reference_mut(inner: TypeRef) -> Self {
        Self::Ref {
            mutable: true,
            inner: Box::new(inner),
        }
    }

    pub fn ptr(mutable: bool, inner: TypeRef) -> Self {
        Self::Ptr {
            mutable,
            inner: Box::new(inner),
        }
    }

    pub fn array(elem: TypeRef, len: u64) -> Self {
        Self::Array {
            elem: Box::new(elem),
            len,
        }
    }

    pub fn slice(elem: TypeRef) -> Self {
        Self::Slice(Box::new(elem))
    }

    pub fn dyn_trait(bounds: impl IntoIterator<Item = TypePath>) -> Self {
        Self::TraitObject(bounds.into_iter().collect())
    }
}

impl From<TypePath> for TypeRef {
    fn from(path: TypePath) -> Self {
        Self::Path(path)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{path}"),
            Self::Ref { mutable, inner } => {
                write!(f, "&{}{inner}", if *mutable { "mut " } else { "" })
            }
            Self::Ptr { mutable, inner } => {
                write!(f, "*{} {inner}", if *mutable { "mut" } else { "const" })
            }
            Self::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                if elems.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Self::Array { elem, len } => write!(f, "[{elem}; {len}]"),
            Self::Slice(elem) => write!(f, "[{elem}]"),
            Self::TraitObject(bounds) => {
                write!(f, "dyn ")?;
                for (i, bound) in bounds.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{bound}")?;
                }
                Ok(())
            }
            Self::Never => write!(f, "!"),
            Self::Infer => write!(f, "_"),
        }
    }
}

/// A possibly qualified path with generic arguments on any segment, e.g.
/// `ops::Add<i32>` or `Self::Output`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePath {
    pub segments: SmallVec<[PathSegment; 2]>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub ident: SmolStr,
    pub generic_args: Option<GenericArgs>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericArgs {
    pub args: Vec<GenericArg>,
    /// `Item = u8` style bindings, in source order.
    pub bindings: Vec<AssocTypeBinding>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericArg {
    Lifetime(SmolStr),
    Type(TypeRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssocTypeBinding {
    pub name: SmolStr,
    pub ty: TypeRef,
}

impl TypePath {
    /// Builds a path from `::`-separated segments without generic arguments.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split("::")
                .map(|ident| PathSegment {
                    ident: ident.into(),
                    generic_args: None,
                })
                .collect(),
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Attaches type arguments to the final segment.
    pub fn with_type_args(self, args: impl IntoIterator<Item = TypeRef>) -> Self {
        let args = args.into_iter().map(GenericArg::Type).collect();
        self.with_generic_args(args, Vec::new())
    }

    pub fn with_generic_args(
        mut self,
        args: Vec<GenericArg>,
        bindings: Vec<AssocTypeBinding>,
    ) -> Self {
        let span = self.span;
        if let Some(last) = self.segments.last_mut() {
            last.generic_args = Some(GenericArgs {
                args,
                bindings,
                span,
            });
        }
        self
    }

    pub fn final_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn generic_args(&self) -> Option<&GenericArgs> {
        self.final_segment()?.generic_args.as_ref()
    }

    /// The path text without generic arguments, e.g. `ops::Add`.
    pub fn plain(&self) -> String {
        self.segments
            .iter()
            .map(|seg| seg.ident.as_str())
            .collect::<Vec<_>>()
            .join("::")
    }

    pub fn is_single(&self) -> bool {
        self.segments.len() == 1
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "::")?;
            }
            write!(f, "{}", seg.ident)?;
            if let Some(args) = &seg.generic_args {
                write!(f, "{args}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for GenericArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self.args.iter().map(|arg| match arg {
            GenericArg::Lifetime(name) => format!("'{name}"),
            GenericArg::Type(ty) => ty.to_string(),
        });
        let bindings = self
            .bindings
            .iter()
            .map(|binding| format!("{} = {}", binding.name, binding.ty));
        let joined = args.chain(bindings).collect::<Vec<_>>().join(", ");
        write!(f, "<{joined}>")
    }
}
