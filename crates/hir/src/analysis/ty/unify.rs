//! Structural type equality used by bound probing.

use super::ty_def::{InferTy, Mutability, Ty};

impl Ty {
    /// Returns `true` if a value of type `other` can be used where `self` is
    /// expected. See [`can_eq`].
    pub fn can_eq(&self, other: &Ty, coerce: bool) -> bool {
        can_eq(self, other, coerce)
    }
}

/// Directional equality check between an expected type `a` and a candidate
/// `b`.
///
/// A generic parameter on the right accepts anything, while a parameter on the
/// left only matches the same parameter. Inference variables accept any type
/// of their class. With `coerce`, `&mut T` is accepted for `&T`, `*mut T` for
/// `*const T` and `!` for any type; coercions apply at the top level only.
pub fn can_eq(a: &Ty, b: &Ty, coerce: bool) -> bool {
    match (a, b) {
        (Ty::Error, _) | (_, Ty::Error) => false,

        (_, Ty::Param(_)) => true,

        (Ty::Infer(InferTy::General), _) | (_, Ty::Infer(InferTy::General)) => true,
        (Ty::Infer(InferTy::Integral), other) | (other, Ty::Infer(InferTy::Integral)) => {
            matches!(
                other,
                Ty::Int(_) | Ty::Uint(_) | Ty::Infer(InferTy::Integral)
            )
        }
        (Ty::Infer(InferTy::Float), other) | (other, Ty::Infer(InferTy::Float)) => {
            matches!(other, Ty::Float(_) | Ty::Infer(InferTy::Float))
        }

        (Ty::Param(_), _) => false,

        (_, Ty::Never) if coerce => true,

        (Ty::Tuple(xs), Ty::Tuple(ys)) => all_eq(xs, ys),
        (Ty::Adt(x), Ty::Adt(y)) => x.def == y.def && all_eq(&x.args, &y.args),
        (Ty::Ref(m1, x), Ty::Ref(m2, y)) | (Ty::Ptr(m1, x), Ty::Ptr(m2, y)) => {
            mutability_eq(*m1, *m2, coerce) && can_eq(x, y, false)
        }
        (Ty::Array(x, n), Ty::Array(y, m)) => n == m && can_eq(x, y, false),
        (Ty::Slice(x), Ty::Slice(y)) => can_eq(x, y, false),
        (Ty::Fn(f), Ty::Fn(g)) => {
            let receivers = match (&f.receiver, &g.receiver) {
                (Some(x), Some(y)) => can_eq(x, y, false),
                (None, None) => true,
                _ => false,
            };
            receivers && all_eq(&f.params, &g.params) && can_eq(&f.ret, &g.ret, false)
        }
        (Ty::Placeholder(x), Ty::Placeholder(y)) => x == y,
        (Ty::Projection(x), Ty::Projection(y)) => {
            x.trait_id == y.trait_id && x.name == y.name && can_eq(&x.self_ty, &y.self_ty, false)
        }
        (Ty::Dynamic(x), Ty::Dynamic(y)) => {
            x.bounds.len() == y.bounds.len()
                && x.bounds.iter().zip(&y.bounds).all(|(bx, by)| {
                    bx.trait_id == by.trait_id && all_eq(&bx.args, &by.args)
                })
        }

        (Ty::Bool, Ty::Bool)
        | (Ty::Char, Ty::Char)
        | (Ty::Str, Ty::Str)
        | (Ty::Never, Ty::Never) => true,
        (Ty::Int(x), Ty::Int(y)) => x == y,
        (Ty::Uint(x), Ty::Uint(y)) => x == y,
        (Ty::Float(x), Ty::Float(y)) => x == y,

        _ => false,
    }
}

fn all_eq(xs: &[Ty], ys: &[Ty]) -> bool {
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| can_eq(x, y, false))
}

fn mutability_eq(expected: Mutability, found: Mutability, coerce: bool) -> bool {
    expected == found || (coerce && expected == Mutability::Not && found == Mutability::Mut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::ty::ty_def::{AdtTy, IntTy, UintTy},
        hir_def::{DefId, HirId},
    };

    fn point() -> Ty {
        Ty::Adt(AdtTy {
            def: DefId::from_u32(0),
            name: "Point".into(),
            args: vec![],
        })
    }

    #[test]
    fn params_are_only_open_on_the_right() {
        let t = Ty::param(HirId::from_u32(0), "T");
        assert!(point().can_eq(&t, false));
        assert!(!t.can_eq(&point(), false));
        assert!(t.can_eq(&t, false));
    }

    #[test]
    fn coercions() {
        let shared = Ty::reference(Ty::Bool);
        let unique = Ty::reference_mut(Ty::Bool);
        assert!(!shared.can_eq(&unique, false));
        assert!(shared.can_eq(&unique, true));
        assert!(!unique.can_eq(&shared, true));

        assert!(!Ty::Char.can_eq(&Ty::Never, false));
        assert!(Ty::Char.can_eq(&Ty::Never, true));
    }

    #[test]
    fn inference_classes() {
        let int_var = Ty::Infer(InferTy::Integral);
        assert!(int_var.can_eq(&Ty::Int(IntTy::I64), false));
        assert!(Ty::Uint(UintTy::U8).can_eq(&int_var, false));
        assert!(!int_var.can_eq(&Ty::Bool, false));
        assert!(Ty::Infer(InferTy::General).can_eq(&point(), false));
        assert!(!Ty::Error.can_eq(&Ty::Infer(InferTy::General), false));
    }

    #[test]
    fn structural() {
        let t = Ty::param(HirId::from_u32(0), "T");
        let a = Ty::Tuple(vec![point(), Ty::Array(Box::new(Ty::Char), 2)]);
        let b = Ty::Tuple(vec![t, Ty::Array(Box::new(Ty::Char), 2)]);
        assert!(a.can_eq(&b, false));
        assert!(!b.can_eq(&a, false));
        assert!(!a.can_eq(&Ty::Tuple(vec![point()]), false));
    }
}
