use hir::{
    HirDb,
    analysis::ty::ty_def::{FloatTy, IntTy, Mutability, Ty, UintTy},
    hir_def::{CanonicalPath, DefId, Namespace},
};
use smol_str::SmolStr;

use crate::{MangleError, punycode};

const SYMBOL_PREFIX: &str = "_R";
const BASE62_DIGITS: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `_R` followed by the structural encoding of `path`. Trait-impl segments
/// use the `X <impl-path> <type> <trait-path>` form.
pub(crate) fn mangle_item(db: &dyn HirDb, path: &CanonicalPath) -> Result<String, MangleError> {
    let mut builder = SymbolBuilder {
        db,
        out: String::from(SYMBOL_PREFIX),
    };
    builder.push_path(path, path.segments.len())?;
    Ok(builder.out)
}

struct SymbolBuilder<'db> {
    db: &'db dyn HirDb,
    out: String,
}

impl SymbolBuilder<'_> {
    /// Encodes the crate root and the first `len` segments of `path`.
    fn push_path(&mut self, path: &CanonicalPath, len: usize) -> Result<(), MangleError> {
        let Some(seg) = len.checked_sub(1).and_then(|idx| path.segments.get(idx)) else {
            self.out.push('C');
            self.push_disambiguator(path.crate_disambiguator);
            return self.push_identifier(&path.crate_name);
        };

        if let Some(trait_impl) = &seg.trait_impl {
            self.out.push('X');
            self.push_disambiguator(seg.disambiguator);
            self.push_path(path, len - 1)?;
            self.push_ty(&trait_impl.self_ty)?;
            let trait_path = &trait_impl.trait_path;
            return self.push_path(trait_path, trait_path.segments.len());
        }

        let generic = !seg.generic_args.is_empty();
        if generic {
            self.out.push('I');
        }
        self.out.push('N');
        self.out.push(match seg.ns {
            Namespace::Type => 't',
            Namespace::Value => 'v',
        });
        self.push_path(path, len - 1)?;
        self.push_disambiguator(seg.disambiguator);
        self.push_identifier(&seg.name)?;

        if generic {
            for arg in &seg.generic_args {
                self.push_ty(arg)?;
            }
            self.out.push('E');
        }
        Ok(())
    }

    fn push_def_path(&mut self, def: DefId, name: &SmolStr, args: &[Ty]) -> Result<(), MangleError> {
        let path = self
            .db
            .canonical_path(def)
            .ok_or_else(|| MangleError::UnknownDefinition { name: name.clone() })?
            .with_generic_args(args.to_vec());
        self.push_path(&path, path.segments.len())
    }

    fn push_ty(&mut self, ty: &Ty) -> Result<(), MangleError> {
        match ty {
            Ty::Bool => self.out.push('b'),
            Ty::Char => self.out.push('c'),
            Ty::Str => self.out.push('e'),
            Ty::Never => self.out.push('z'),
            Ty::Int(int) => self.out.push(int_prefix(*int)),
            Ty::Uint(uint) => self.out.push(uint_prefix(*uint)),
            Ty::Float(FloatTy::F32) => self.out.push('f'),
            Ty::Float(FloatTy::F64) => self.out.push('d'),

            Ty::Tuple(elems) if elems.is_empty() => self.out.push('u'),
            Ty::Tuple(elems) => {
                self.out.push('T');
                for elem in elems {
                    self.push_ty(elem)?;
                }
                self.out.push('E');
            }

            Ty::Adt(adt) => self.push_def_path(adt.def, &adt.name, &adt.args)?,

            Ty::Ref(mutability, inner) => {
                self.out.push(match mutability {
                    Mutability::Not => 'R',
                    Mutability::Mut => 'Q',
                });
                self.push_ty(inner)?;
            }
            Ty::Ptr(mutability, inner) => {
                self.out.push(match mutability {
                    Mutability::Not => 'P',
                    Mutability::Mut => 'O',
                });
                self.push_ty(inner)?;
            }
            Ty::Array(elem, len) => {
                self.out.push('A');
                self.push_ty(elem)?;
                self.out.push_str(&format!("j{len:x}_"));
            }
            Ty::Slice(elem) => {
                self.out.push('S');
                self.push_ty(elem)?;
            }

            Ty::Fn(func) => {
                self.out.push('F');
                for param in func.receiver.as_deref().into_iter().chain(&func.params) {
                    self.push_ty(param)?;
                }
                self.out.push('E');
                self.push_ty(&func.ret)?;
            }

            Ty::Dynamic(dyn_ty) => {
                self.out.push('D');
                for bound in &dyn_ty.bounds {
                    self.push_def_path(bound.trait_id, &bound.trait_name, &bound.args)?;
                }
                self.out.push('E');
                // Erased lifetime.
                self.out.push_str("L_");
            }

            Ty::Param(_) | Ty::Placeholder(_) | Ty::Projection(_) | Ty::Infer(_) | Ty::Error => {
                self.out.push('p')
            }
        }
        Ok(())
    }

    fn push_disambiguator(&mut self, dis: u64) {
        if dis > 0 {
            self.out.push('s');
            push_integer_62(&mut self.out, dis);
        }
    }

    fn push_identifier(&mut self, ident: &str) -> Result<(), MangleError> {
        let punycoded = !ident.is_ascii();
        let encoded = if punycoded {
            punycode::encode(ident)
                .ok_or_else(|| MangleError::Punycode {
                    identifier: SmolStr::new(ident),
                })?
                .replace('-', "_")
        } else {
            ident.to_string()
        };
        if encoded.is_empty() || !encoded.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(MangleError::InvalidIdentifier {
                identifier: SmolStr::new(ident),
            });
        }

        if punycoded {
            self.out.push('u');
        }

        self.out.push_str(&encoded.len().to_string());
        if encoded.starts_with(|c: char| c == '_' || c.is_ascii_digit()) {
            self.out.push('_');
        }
        self.out.push_str(&encoded);
        Ok(())
    }
}

/// `0` is `_`; any other value is `x - 1` in base 62 followed by `_`.
fn push_integer_62(out: &mut String, x: u64) {
    if let Some(mut rest) = x.checked_sub(1) {
        let mut digits = Vec::new();
        loop {
            digits.push(BASE62_DIGITS[(rest % 62) as usize]);
            rest /= 62;
            if rest == 0 {
                break;
            }
        }
        out.extend(digits.iter().rev().map(|&d| char::from(d)));
    }
    out.push('_');
}

fn int_prefix(int: IntTy) -> char {
    match int {
        IntTy::I8 => 'a',
        IntTy::I16 => 's',
        IntTy::I32 => 'l',
        IntTy::I64 => 'x',
        IntTy::I128 => 'n',
        IntTy::Isize => 'i',
    }
}

fn uint_prefix(uint: UintTy) -> char {
    match uint {
        UintTy::U8 => 'h',
        UintTy::U16 => 't',
        UintTy::U32 => 'm',
        UintTy::U64 => 'y',
        UintTy::U128 => 'o',
        UintTy::Usize => 'j',
    }
}
