//! Builders used to populate an [`ItemTree`](super::ItemTree).
//!
//! The builders play the role of AST lowering: they allocate `HirId`s and
//! insert the implicit `Self` parameter of every trait.

use common::diagnostics::Span;
use smol_str::SmolStr;

use super::{
    Body, DefId, FuncDecl, FuncParam, GenericParam, HirId, ImplBlock, ImplId, ImplItem,
    ImplItemKind, LifetimeParam, SELF_PARAM, SelfParam, Trait, TraitItem, TraitItemKind,
    TypeBound, TypeParam, TypePath, TypeRef,
};

#[derive(Debug, Default)]
pub struct HirIdAllocator {
    next: u32,
}

impl HirIdAllocator {
    pub fn alloc(&mut self) -> HirId {
        let id = HirId::from_u32(self.next);
        self.next += 1;
        id
    }
}

fn type_param(
    ids: &mut HirIdAllocator,
    name: &str,
    bounds: Vec<TypeBound>,
    default: Option<TypeRef>,
    span: Span,
) -> GenericParam {
    GenericParam::Type(TypeParam {
        hir_id: ids.alloc(),
        name: name.into(),
        bounds,
        default,
        span,
    })
}

fn trait_bounds(bounds: impl IntoIterator<Item = TypePath>) -> Vec<TypeBound> {
    bounds.into_iter().map(TypeBound::Trait).collect()
}

pub struct TraitBuilder<'a> {
    ids: &'a mut HirIdAllocator,
    trait_: Trait,
}

impl<'a> TraitBuilder<'a> {
    pub(super) fn new(ids: &'a mut HirIdAllocator, def_id: DefId, name: SmolStr, span: Span) -> Self {
        let self_param = type_param(ids, SELF_PARAM, Vec::new(), None, span);
        Self {
            ids,
            trait_: Trait {
                def_id,
                name,
                generic_params: vec![self_param],
                super_traits: Vec::new(),
                items: Vec::new(),
                span,
            },
        }
    }

    pub fn span(&mut self, span: Span) -> &mut Self {
        self.trait_.span = span;
        if let Some(GenericParam::Type(self_param)) = self.trait_.generic_params.first_mut() {
            self_param.span = span;
        }
        self
    }

    pub fn lifetime_param(&mut self, name: &str) -> &mut Self {
        let param = GenericParam::Lifetime(LifetimeParam {
            hir_id: self.ids.alloc(),
            name: name.into(),
            span: self.trait_.span,
        });
        self.trait_.generic_params.push(param);
        self
    }

    pub fn type_param(&mut self, name: &str) -> &mut Self {
        self.bounded_type_param(name, [])
    }

    pub fn bounded_type_param(
        &mut self,
        name: &str,
        bounds: impl IntoIterator<Item = TypePath>,
    ) -> &mut Self {
        let param = type_param(self.ids, name, trait_bounds(bounds), None, self.trait_.span);
        self.trait_.generic_params.push(param);
        self
    }

    /// `trait Add<Rhs = Self>`
    pub fn defaulted_type_param(&mut self, name: &str, default: TypeRef) -> &mut Self {
        let param = type_param(self.ids, name, Vec::new(), Some(default), self.trait_.span);
        self.trait_.generic_params.push(param);
        self
    }

    pub fn super_trait(&mut self, path: TypePath) -> &mut Self {
        self.trait_.super_traits.push(TypeBound::Trait(path));
        self
    }

    pub fn assoc_type(&mut self, name: &str, default: Option<TypeRef>) -> &mut Self {
        self.bounded_assoc_type(name, [], default)
    }

    pub fn bounded_assoc_type(
        &mut self,
        name: &str,
        bounds: impl IntoIterator<Item = TypePath>,
        default: Option<TypeRef>,
    ) -> &mut Self {
        let kind = TraitItemKind::Type {
            bounds: trait_bounds(bounds),
            default,
        };
        self.push_item(name, kind)
    }

    pub fn assoc_const(&mut self, name: &str, ty: TypeRef, default: Option<Body>) -> &mut Self {
        self.push_item(name, TraitItemKind::Const { ty, default })
    }

    pub fn method(&mut self, name: &str, build: impl FnOnce(&mut FuncBuilder)) -> &mut Self {
        let mut builder = FuncBuilder::new(self.ids);
        build(&mut builder);
        let FuncBuilder { decl, span, .. } = builder;
        self.push_item(name, TraitItemKind::Func(decl));
        if let Some(span) = span {
            self.item_span(span);
        }
        self
    }

    /// Sets the span of the most recently added item.
    pub fn item_span(&mut self, span: Span) -> &mut Self {
        if let Some(item) = self.trait_.items.last_mut() {
            item.span = span;
        }
        self
    }

    fn push_item(&mut self, name: &str, kind: TraitItemKind) -> &mut Self {
        self.trait_.items.push(TraitItem {
            hir_id: self.ids.alloc(),
            name: name.into(),
            kind,
            span: self.trait_.span,
        });
        self
    }

    pub(super) fn finish(self) -> Trait {
        self.trait_
    }
}

pub struct FuncBuilder<'a> {
    ids: &'a mut HirIdAllocator,
    decl: FuncDecl,
    span: Option<Span>,
}

impl<'a> FuncBuilder<'a> {
    fn new(ids: &'a mut HirIdAllocator) -> Self {
        Self {
            ids,
            decl: FuncDecl {
                generic_params: Vec::new(),
                self_param: None,
                params: Vec::new(),
                ret_ty: None,
                body: None,
            },
            span: None,
        }
    }

    pub fn self_param(&mut self, self_param: SelfParam) -> &mut Self {
        self.decl.self_param = Some(self_param);
        self
    }

    pub fn type_param(&mut self, name: &str) -> &mut Self {
        self.bounded_type_param(name, [])
    }

    pub fn bounded_type_param(
        &mut self,
        name: &str,
        bounds: impl IntoIterator<Item = TypePath>,
    ) -> &mut Self {
        let span = self.span.unwrap_or_default();
        let param = type_param(self.ids, name, trait_bounds(bounds), None, span);
        self.decl.generic_params.push(param);
        self
    }

    pub fn param(&mut self, name: &str, ty: TypeRef) -> &mut Self {
        self.decl.params.push(FuncParam {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn ret(&mut self, ty: TypeRef) -> &mut Self {
        self.decl.ret_ty = Some(ty);
        self
    }

    pub fn body(&mut self, body: Body) -> &mut Self {
        self.decl.body = Some(body);
        self
    }

    pub fn span(&mut self, span: Span) -> &mut Self {
        self.span = Some(span);
        self
    }
}

pub struct ImplBuilder<'a> {
    ids: &'a mut HirIdAllocator,
    block: ImplBlock,
}

impl<'a> ImplBuilder<'a> {
    pub(super) fn new(ids: &'a mut HirIdAllocator, id: ImplId, self_ty: TypeRef) -> Self {
        let self_ty_hir_id = ids.alloc();
        Self {
            ids,
            block: ImplBlock {
                id,
                generic_params: Vec::new(),
                trait_ref: None,
                self_ty,
                self_ty_hir_id,
                items: Vec::new(),
                span: Span::default(),
            },
        }
    }

    /// Turns the impl into `impl Trait for SelfTy`.
    pub fn for_trait(&mut self, path: TypePath) -> &mut Self {
        self.block.trait_ref = Some(path);
        self
    }

    pub fn type_param(&mut self, name: &str) -> &mut Self {
        self.bounded_type_param(name, [])
    }

    pub fn bounded_type_param(
        &mut self,
        name: &str,
        bounds: impl IntoIterator<Item = TypePath>,
    ) -> &mut Self {
        let param = type_param(self.ids, name, trait_bounds(bounds), None, self.block.span);
        self.block.generic_params.push(param);
        self
    }

    pub fn assoc_type(&mut self, name: &str, ty: TypeRef) -> &mut Self {
        self.push_item(name, ImplItemKind::Type(ty))
    }

    pub fn assoc_const(&mut self, name: &str) -> &mut Self {
        self.push_item(name, ImplItemKind::Const)
    }

    pub fn method(&mut self, name: &str) -> &mut Self {
        self.push_item(name, ImplItemKind::Func)
    }

    pub fn span(&mut self, span: Span) -> &mut Self {
        self.block.span = span;
        self
    }

    fn push_item(&mut self, name: &str, kind: ImplItemKind) -> &mut Self {
        self.block.items.push(ImplItem {
            name: name.into(),
            kind,
            span: self.block.span,
        });
        self
    }

    pub(super) fn finish(self) -> ImplBlock {
        self.block
    }
}
