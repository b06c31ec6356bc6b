use std::fmt;

use smol_str::SmolStr;

use crate::hir_def::{DefId, HirId, SELF_PARAM};

/// A lowered, semantic type.
///
/// `Display` prints the type in surface syntax; the printed form doubles as the
/// signature string hashed by legacy symbol mangling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Bool,
    Char,
    Str,
    Never,
    Int(IntTy),
    Uint(UintTy),
    Float(FloatTy),
    /// The unit type is the empty tuple.
    Tuple(Vec<Ty>),
    Adt(AdtTy),
    Ref(Mutability, Box<Ty>),
    Ptr(Mutability, Box<Ty>),
    Array(Box<Ty>, u64),
    Slice(Box<Ty>),
    Fn(FnTy),
    Param(ParamTy),
    /// The declared type of an associated type item inside its trait.
    Placeholder(PlaceholderTy),
    /// `<T as Trait>::Name`
    Projection(ProjectionTy),
    Dynamic(DynTy),
    Infer(InferTy),
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntTy {
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UintTy {
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatTy {
    F32,
    F64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Not,
    Mut,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdtTy {
    pub def: DefId,
    pub name: SmolStr,
    pub args: Vec<Ty>,
}

/// The signature of a trait method. The receiver, if any, is kept apart from
/// the remaining parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FnTy {
    pub name: SmolStr,
    pub receiver: Option<Box<Ty>>,
    pub params: Vec<Ty>,
    pub ret: Box<Ty>,
    /// Type parameters declared by the method itself.
    pub own_params: Vec<ParamTy>,
}

impl FnTy {
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamTy {
    pub hir_id: HirId,
    pub name: SmolStr,
}

impl ParamTy {
    pub fn new(hir_id: HirId, name: SmolStr) -> Self {
        Self { hir_id, name }
    }

    pub fn is_trait_self(&self) -> bool {
        self.name == SELF_PARAM
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceholderTy {
    pub trait_id: DefId,
    pub name: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionTy {
    pub self_ty: Box<Ty>,
    pub trait_id: DefId,
    pub trait_name: SmolStr,
    pub name: SmolStr,
}

/// `dyn A<X> + B`. Bounds are kept in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DynTy {
    pub bounds: Vec<DynBound>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DynBound {
    pub trait_id: DefId,
    pub trait_name: SmolStr,
    /// Arguments for the non-receiver parameters.
    pub args: Vec<Ty>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferTy {
    General,
    Integral,
    Float,
}

impl Ty {
    pub fn unit() -> Self {
        Self::Tuple(Vec::new())
    }

    pub fn reference(inner: Ty) -> Self {
        Self::Ref(Mutability::Not, Box::new(inner))
    }

    pub fn reference_mut(inner: Ty) -> Self {
        Self::Ref(Mutability::Mut, Box::new(inner))
    }

    pub fn param(hir_id: HirId, name: impl Into<SmolStr>) -> Self {
        Self::Param(ParamTy::new(hir_id, name.into()))
    }

    /// Resolves a single-segment primitive type name.
    pub fn from_primitive_name(name: &str) -> Option<Self> {
        let ty = match name {
            "bool" => Self::Bool,
            "char" => Self::Char,
            "str" => Self::Str,
            "i8" => Self::Int(IntTy::I8),
            "i16" => Self::Int(IntTy::I16),
            "i32" => Self::Int(IntTy::I32),
            "i64" => Self::Int(IntTy::I64),
            "i128" => Self::Int(IntTy::I128),
            "isize" => Self::Int(IntTy::Isize),
            "u8" => Self::Uint(UintTy::U8),
            "u16" => Self::Uint(UintTy::U16),
            "u32" => Self::Uint(UintTy::U32),
            "u64" => Self::Uint(UintTy::U64),
            "u128" => Self::Uint(UintTy::U128),
            "usize" => Self::Uint(UintTy::Usize),
            "f32" => Self::Float(FloatTy::F32),
            "f64" => Self::Float(FloatTy::F64),
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Tuple(elems) if elems.is_empty())
    }

    pub fn as_param(&self) -> Option<&ParamTy> {
        match self {
            Self::Param(param) => Some(param),
            _ => None,
        }
    }

    /// Returns `true` if the type mentions a generic parameter anywhere.
    pub fn has_param(&self) -> bool {
        match self {
            Self::Param(_) => true,
            Self::Tuple(elems) => elems.iter().any(Ty::has_param),
            Self::Adt(adt) => adt.args.iter().any(Ty::has_param),
            Self::Ref(_, inner) | Self::Ptr(_, inner) | Self::Array(inner, _) | Self::Slice(inner) => {
                inner.has_param()
            }
            Self::Fn(func) => {
                func.receiver.as_deref().is_some_and(Ty::has_param)
                    || func.params.iter().any(Ty::has_param)
                    || func.ret.has_param()
            }
            Self::Projection(proj) => proj.self_ty.has_param(),
            Self::Dynamic(dyn_ty) => dyn_ty
                .bounds
                .iter()
                .any(|bound| bound.args.iter().any(Ty::has_param)),
            Self::Bool
            | Self::Char
            | Self::Str
            | Self::Never
            | Self::Int(_)
            | Self::Uint(_)
            | Self::Float(_)
            | Self::Placeholder(_)
            | Self::Infer(_)
            | Self::Error => false,
        }
    }

    /// Returns `true` if the type is or contains the error type.
    pub fn has_error(&self) -> bool {
        match self {
            Self::Error => true,
            Self::Tuple(elems) => elems.iter().any(Ty::has_error),
            Self::Adt(adt) => adt.args.iter().any(Ty::has_error),
            Self::Ref(_, inner) | Self::Ptr(_, inner) | Self::Array(inner, _) | Self::Slice(inner) => {
                inner.has_error()
            }
            Self::Fn(func) => {
                func.receiver.as_deref().is_some_and(Ty::has_error)
                    || func.params.iter().any(Ty::has_error)
                    || func.ret.has_error()
            }
            Self::Projection(proj) => proj.self_ty.has_error(),
            Self::Dynamic(dyn_ty) => dyn_ty
                .bounds
                .iter()
                .any(|bound| bound.args.iter().any(Ty::has_error)),
            _ => false,
        }
    }

    pub fn pretty_print(&self) -> String {
        self.to_string()
    }
}

impl IntTy {
    pub fn name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::I128 => "i128",
            Self::Isize => "isize",
        }
    }
}

impl UintTy {
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
            Self::Usize => "usize",
        }
    }
}

impl FloatTy {
    pub fn name(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, tys: &[Ty]) -> fmt::Result {
    for (i, ty) in tys.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Char => write!(f, "char"),
            Self::Str => write!(f, "str"),
            Self::Never => write!(f, "!"),
            Self::Int(int) => write!(f, "{}", int.name()),
            Self::Uint(uint) => write!(f, "{}", uint.name()),
            Self::Float(float) => write!(f, "{}", float.name()),
            Self::Tuple(elems) => {
                write!(f, "(")?;
                write_list(f, elems)?;
                if elems.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Self::Adt(adt) => {
                write!(f, "{}", adt.name)?;
                if !adt.args.is_empty() {
                    write!(f, "<")?;
                    write_list(f, &adt.args)?;
                    write!(f, ">")?;
                }
                Ok(())
            }
            Self::Ref(Mutability::Not, inner) => write!(f, "&{inner}"),
            Self::Ref(Mutability::Mut, inner) => write!(f, "&mut {inner}"),
            Self::Ptr(Mutability::Not, inner) => write!(f, "*const {inner}"),
            Self::Ptr(Mutability::Mut, inner) => write!(f, "*mut {inner}"),
            Self::Array(elem, len) => write!(f, "[{elem}; {len}]"),
            Self::Slice(elem) => write!(f, "[{elem}]"),
            Self::Fn(func) => {
                write!(f, "fn(")?;
                if let Some(receiver) = &func.receiver {
                    write!(f, "{receiver}")?;
                    if !func.params.is_empty() {
                        write!(f, ", ")?;
                    }
                }
                write_list(f, &func.params)?;
                write!(f, ") -> {}", func.ret)
            }
            Self::Param(param) => write!(f, "{}", param.name),
            Self::Placeholder(placeholder) => write!(f, "{}", placeholder.name),
            Self::Projection(proj) => {
                write!(f, "<{} as {}>::{}", proj.self_ty, proj.trait_name, proj.name)
            }
            Self::Dynamic(dyn_ty) => {
                write!(f, "dyn ")?;
                for (i, bound) in dyn_ty.bounds.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{}", bound.trait_name)?;
                    if !bound.args.is_empty() {
                        write!(f, "<")?;
                        write_list(f, &bound.args)?;
                        write!(f, ">")?;
                    }
                }
                Ok(())
            }
            Self::Infer(InferTy::General) => write!(f, "_"),
            Self::Infer(InferTy::Integral) => write!(f, "{{integer}}"),
            Self::Infer(InferTy::Float) => write!(f, "{{float}}"),
            Self::Error => write!(f, "<error>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_print_surface_syntax() {
        let t = Ty::param(HirId::from_u32(0), "T");
        let fn_ty = Ty::Fn(FnTy {
            name: "call".into(),
            receiver: Some(Box::new(Ty::reference(Ty::param(HirId::from_u32(1), "Self")))),
            params: vec![Ty::reference(t.clone()), Ty::Tuple(vec![Ty::Bool])],
            ret: Box::new(Ty::unit()),
            own_params: vec![],
        });
        assert_eq!(fn_ty.to_string(), "fn(&Self, &T, (bool,)) -> ()");

        let arr = Ty::Ptr(Mutability::Mut, Box::new(Ty::Array(Box::new(Ty::Uint(UintTy::U8)), 4)));
        assert_eq!(arr.to_string(), "*mut [u8; 4]");
    }

    #[test]
    fn primitive_names() {
        assert_eq!(Ty::from_primitive_name("usize"), Some(Ty::Uint(UintTy::Usize)));
        assert_eq!(Ty::from_primitive_name("Point"), None);
        assert!(Ty::reference(Ty::param(HirId::from_u32(3), "T")).has_param());
        assert!(!Ty::Slice(Box::new(Ty::Char)).has_param());
        assert!(Ty::Tuple(vec![Ty::Bool, Ty::reference(Ty::Error)]).has_error());
        assert!(!Ty::unit().has_error());
    }
}
