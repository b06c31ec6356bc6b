use common::diagnostics::Span;
use smallvec::SmallVec;
use smol_str::SmolStr;

use super::{DefId, HirId, ImplId, TypePath, TypeRef};

pub const SELF_PARAM: &str = "Self";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Module path of the item, excluding the crate and the item's own name.
    pub module: SmallVec<[SmolStr; 2]>,
    pub kind: ItemKind,
}

impl Item {
    pub fn name(&self) -> &SmolStr {
        match &self.kind {
            ItemKind::Trait(trait_) => &trait_.name,
            ItemKind::Adt(adt) => &adt.name,
        }
    }

    pub fn span(&self) -> Span {
        match &self.kind {
            ItemKind::Trait(trait_) => trait_.span,
            ItemKind::Adt(adt) => adt.span,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ItemKind::Trait(_) => "trait",
            ItemKind::Adt(adt) => adt.kind.kind_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Trait(Trait),
    Adt(AdtDef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trait {
    pub def_id: DefId,
    pub name: SmolStr,
    /// Generic parameters in declaration order. The implicit `Self` parameter
    /// is always the first type parameter.
    pub generic_params: Vec<GenericParam>,
    pub super_traits: Vec<TypeBound>,
    pub items: Vec<TraitItem>,
    pub span: Span,
}

impl Trait {
    pub fn item(&self, name: &str) -> Option<&TraitItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn type_params(&self) -> impl Iterator<Item = &TypeParam> {
        self.generic_params.iter().filter_map(GenericParam::as_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericParam {
    Lifetime(LifetimeParam),
    Type(TypeParam),
}

impl GenericParam {
    pub fn as_type(&self) -> Option<&TypeParam> {
        match self {
            Self::Type(param) => Some(param),
            Self::Lifetime(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifetimeParam {
    pub hir_id: HirId,
    pub name: SmolStr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub hir_id: HirId,
    pub name: SmolStr,
    pub bounds: Vec<TypeBound>,
    pub default: Option<TypeRef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeBound {
    Trait(TypePath),
    Lifetime(SmolStr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitItem {
    pub hir_id: HirId,
    pub name: SmolStr,
    pub kind: TraitItemKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraitItemKind {
    Type {
        bounds: Vec<TypeBound>,
        default: Option<TypeRef>,
    },
    Const {
        ty: TypeRef,
        default: Option<Body>,
    },
    Func(FuncDecl),
}

impl TraitItemKind {
    pub fn has_default(&self) -> bool {
        match self {
            Self::Type { default, .. } => default.is_some(),
            Self::Const { default, .. } => default.is_some(),
            Self::Func(func) => func.body.is_some(),
        }
    }

    pub fn default_body(&self) -> Option<&Body> {
        match self {
            Self::Const { default, .. } => default.as_ref(),
            Self::Func(func) => func.body.as_ref(),
            Self::Type { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub generic_params: Vec<GenericParam>,
    pub self_param: Option<SelfParam>,
    pub params: Vec<FuncParam>,
    pub ret_ty: Option<TypeRef>,
    pub body: Option<Body>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelfParam {
    /// `self`
    Value,
    /// `&self`
    Ref,
    /// `&mut self`
    RefMut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncParam {
    pub name: SmolStr,
    pub ty: TypeRef,
}

/// The trait-relevant summary of a default body: every bound or associated
/// item the body names. Type checking of the body checks these once the
/// enclosing trait is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    pub uses: Vec<BodyUse>,
}

impl Body {
    pub fn new(uses: impl IntoIterator<Item = BodyUse>) -> Self {
        Self {
            uses: uses.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyUse {
    /// A trait bound required inside the body, e.g. `where T: Clone`.
    Bound(TypePath),
    /// `<_ as Trait>::item` or `Trait::item(..)`.
    AssocItem { trait_path: TypePath, item: SmolStr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdtDef {
    pub def_id: DefId,
    pub name: SmolStr,
    pub kind: AdtKind,
    pub generic_params: Vec<GenericParam>,
    pub span: Span,
}

impl AdtDef {
    pub fn type_params(&self) -> impl Iterator<Item = &TypeParam> {
        self.generic_params.iter().filter_map(GenericParam::as_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdtKind {
    Struct,
    Enum,
}

impl AdtKind {
    pub fn kind_name(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Enum => "enum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplBlock {
    pub id: ImplId,
    pub generic_params: Vec<GenericParam>,
    /// `None` for inherent impls.
    pub trait_ref: Option<TypePath>,
    pub self_ty: TypeRef,
    pub self_ty_hir_id: HirId,
    pub items: Vec<ImplItem>,
    pub span: Span,
}

impl ImplBlock {
    pub fn is_trait_impl(&self) -> bool {
        self.trait_ref.is_some()
    }

    pub fn item(&self, name: &str) -> Option<&ImplItem> {
        self.items.iter().find(|item| item.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplItem {
    pub name: SmolStr,
    pub kind: ImplItemKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplItemKind {
    Type(TypeRef),
    Const,
    Func,
}
