//! Generic parameter and argument bindings.

use std::fmt;

use common::diagnostics::Span;

use super::ty_def::{ParamTy, Ty};

/// One declared generic parameter, paired with its placeholder type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubstitutionParamMapping {
    param: ParamTy,
    /// The lowered default (`Rhs = Self`), expressed in terms of the declaring
    /// item's parameters.
    default: Option<Ty>,
    span: Span,
}

impl SubstitutionParamMapping {
    pub fn new(param: ParamTy, default: Option<Ty>, span: Span) -> Self {
        Self {
            param,
            default,
            span,
        }
    }

    pub fn param(&self) -> &ParamTy {
        &self.param
    }

    pub fn param_ty(&self) -> Ty {
        Ty::Param(self.param.clone())
    }

    pub fn default(&self) -> Option<&Ty> {
        self.default.as_ref()
    }

    pub(crate) fn set_default(&mut self, default: Ty) {
        self.default = Some(default);
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_receiver(&self) -> bool {
        self.param.is_trait_self()
    }

    /// Binds `ty` to this parameter. The mapping itself is left untouched.
    pub fn bind(&self, ty: Ty) -> SubstitutionArg {
        SubstitutionArg::new(self.param.clone(), Some(ty))
    }

    pub fn unbound(&self) -> SubstitutionArg {
        SubstitutionArg::new(self.param.clone(), None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubstitutionArg {
    param: ParamTy,
    ty: Option<Ty>,
}

impl SubstitutionArg {
    pub fn new(param: ParamTy, ty: Option<Ty>) -> Self {
        Self { param, ty }
    }

    pub fn param(&self) -> &ParamTy {
        &self.param
    }

    pub fn ty(&self) -> Option<&Ty> {
        self.ty.as_ref()
    }
}

/// An ordered argument list for a parameter list. `error()` is the sentinel
/// for "no valid argument set".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubstitutionArgumentMappings {
    mappings: Vec<SubstitutionArg>,
    span: Option<Span>,
    error: bool,
}

impl SubstitutionArgumentMappings {
    pub fn new(mappings: Vec<SubstitutionArg>, span: Option<Span>) -> Self {
        Self {
            mappings,
            span,
            error: false,
        }
    }

    pub fn error() -> Self {
        Self {
            mappings: Vec::new(),
            span: None,
            error: true,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn get(&self, idx: usize) -> Option<&SubstitutionArg> {
        self.mappings.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubstitutionArg> {
        self.mappings.iter()
    }

    /// Rebinds slot `idx` to `ty`, keeping its parameter.
    pub fn rebind(&mut self, idx: usize, ty: Ty) {
        if let Some(arg) = self.mappings.get_mut(idx) {
            arg.ty = Some(ty);
        }
    }

    /// The type bound to `param`, if any.
    pub fn lookup(&self, param: &ParamTy) -> Option<&Ty> {
        self.mappings
            .iter()
            .find(|arg| arg.param.hir_id == param.hir_id)
            .and_then(SubstitutionArg::ty)
    }

    /// Applies `f` to every bound non-receiver argument.
    pub fn map_args(&mut self, mut f: impl FnMut(&Ty) -> Ty) {
        for arg in self.mappings.iter_mut().skip(1) {
            if let Some(ty) = &arg.ty {
                arg.ty = Some(f(ty));
            }
        }
    }
}

impl fmt::Display for SubstitutionArgumentMappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.error {
            return write!(f, "<error>");
        }
        let args = self
            .mappings
            .iter()
            .map(|arg| match &arg.ty {
                Some(ty) => format!("{}={ty}", arg.param.name),
                None => format!("{}=_", arg.param.name),
            })
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "<{args}>")
    }
}

#[cfg(test)]
mod tests {
    use crate::hir_def::HirId;

    use super::*;

    fn mapping(id: u32, name: &str) -> SubstitutionParamMapping {
        SubstitutionParamMapping::new(
            ParamTy::new(HirId::from_u32(id), name.into()),
            None,
            Span::default(),
        )
    }

    #[test]
    fn bind_leaves_parameter_untouched() {
        let param = mapping(0, "T");
        let copy = param.clone();
        let arg = param.bind(Ty::Bool);
        assert_eq!(param, copy);
        assert_eq!(arg.ty(), Some(&Ty::Bool));
        assert_eq!(arg.param(), param.param());
    }

    #[test]
    fn error_sentinel() {
        let err = SubstitutionArgumentMappings::error();
        assert!(err.is_error());
        assert!(err.is_empty());
        assert_eq!(err.len(), 0);
        assert_eq!(err.to_string(), "<error>");
    }

    #[test]
    fn lookup_and_rebind() {
        let this = mapping(0, "Self");
        let t = mapping(1, "T");
        let mut args = SubstitutionArgumentMappings::new(vec![this.unbound(), t.bind(Ty::Char)], None);
        assert_eq!(args.lookup(this.param()), None);

        args.rebind(0, Ty::Str);
        assert_eq!(args.lookup(this.param()), Some(&Ty::Str));
        assert_eq!(args.to_string(), "<Self=str, T=char>");
    }
}
