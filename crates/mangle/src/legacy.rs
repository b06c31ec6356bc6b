use std::fmt::Write;

use hir::{analysis::ty::ty_def::Ty, hir_def::CanonicalPath};
use smol_str::SmolStr;

use crate::MangleError;

const SYMBOL_PREFIX: &str = "_ZN";
const SYMBOL_DELIM: &str = "E";

const FNV128_OFFSET: u128 = 0x6c62272e07bb014262b821756295c58d;
const FNV128_PRIME: u128 = 0x0000000001000000000000000000013B;

/// `_ZN` + escaped segments + hash of the type signature + `E`.
pub(crate) fn mangle_item(ty: &Ty, path: &CanonicalPath) -> Result<String, MangleError> {
    let mut symbol = String::from(SYMBOL_PREFIX);
    symbol += &mangle_name(&path.crate_name)?;
    for seg in &path.segments {
        let name = if seg.generic_args.is_empty() {
            seg.name.to_string()
        } else {
            let args = seg
                .generic_args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            format!("{}<{args}>", seg.name)
        };
        symbol += &mangle_name(&name)?;
    }
    symbol += &mangle_name(&hash(&ty.to_string()))?;
    symbol += SYMBOL_DELIM;
    Ok(symbol)
}

/// Escapes one segment and prefixes it with its escaped length.
fn mangle_name(name: &str) -> Result<String, MangleError> {
    let mut buffer = String::with_capacity(name.len());
    let mut chars = name.chars().enumerate().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            ' ' => buffer.push_str("$u20$"),
            '&' => buffer.push_str("$RF$"),
            '<' if i == 0 => buffer.push_str("_$LT$"),
            '<' => buffer.push_str("$LT$"),
            '>' => buffer.push_str("$GT$"),
            '*' => buffer.push_str("$BP$"),
            '[' => buffer.push_str("$u5b$"),
            ']' => buffer.push_str("$u5d$"),
            '{' => buffer.push_str("$u7b$"),
            '}' => buffer.push_str("$u7d$"),
            ',' => buffer.push_str("$C$"),
            ':' => {
                if chars.next_if(|(_, next)| *next == ':').is_none() {
                    return Err(MangleError::UnpairedColon {
                        segment: SmolStr::new(name),
                    });
                }
                buffer.push_str("..");
            }
            c if c.is_ascii() => buffer.push(c),
            c => {
                let _ = write!(buffer, "$u{:x}$", c as u32);
            }
        }
    }
    Ok(format!("{}{buffer}", buffer.len()))
}

/// `h` followed by the first 16 hex digits of the FNV-1a 128 fingerprint,
/// low half first.
fn hash(fingerprint: &str) -> String {
    let sum = fingerprint.bytes().fold(FNV128_OFFSET, |hash, byte| {
        (hash ^ u128::from(byte)).wrapping_mul(FNV128_PRIME)
    });
    let hi = (sum >> 64) as u64;
    let lo = sum as u64;
    let mut hex = format!("{lo:08x}{hi:08x}");
    hex.truncate(16);
    format!("h{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes() {
        assert_eq!(mangle_name("foo").unwrap(), "3foo");
        assert_eq!(
            mangle_name("<&T as core::fmt::Debug>").unwrap(),
            "42_$LT$$RF$T$u20$as$u20$core..fmt..Debug$GT$"
        );
        assert_eq!(
            mangle_name("<impl *const [T]>").unwrap(),
            "43_$LT$impl$u20$$BP$const$u20$$u5b$T$u5d$$GT$"
        );
        assert_eq!(mangle_name("Foo<T>").unwrap(), "12Foo$LT$T$GT$");
        assert_eq!(mangle_name("{closure}").unwrap(), "17$u7b$closure$u7d$");
        assert_eq!(mangle_name("ö").unwrap(), "5$uf6$");
    }

    #[test]
    fn single_colon_is_rejected() {
        assert_eq!(
            mangle_name("a:b"),
            Err(MangleError::UnpairedColon { segment: "a:b".into() })
        );
        assert!(mangle_name("a:").is_err());
        assert_eq!(mangle_name("a::b").unwrap(), "4a..b");
    }

    #[test]
    fn fnv_fingerprint() {
        assert_eq!(hash(""), "h62b821756295c58d");
        assert_eq!(hash("bool"), "hb806e97e91d314bd");
        assert_eq!(hash("fn(&Point) -> bool"), "h17ee28199dae3707");
    }
}
