//! Canonical JSON serialization for signed payloads.
//!
//! The ETHYS server re-serializes the payload it receives and verifies the
//! signature against those bytes, so both sides must agree exactly:
//!
//! - object keys sorted by code point, at every nesting level;
//! - `,` and `:` separators, no whitespace;
//! - DEL and every non-ASCII character written as a `\uXXXX` escape (UTF-16
//!   code units, lowercase hex), control characters escaped as usual;
//! - floats in Python `repr` form: positional for decimal exponents in
//!   `-4..16`, otherwise scientific with a signed exponent of at least two
//!   digits (`1e-07`, `1.5e+16`).

use std::io;

use serde::Serialize;
use serde_json::{Map, ser::Formatter};

use crate::{errors::Result, types::AnyJson};

/// Return a copy of `value` whose objects have their keys in sorted order.
pub fn canonicalize(value: &AnyJson) -> AnyJson {
    match value {
        AnyJson::Object(map) => {
            let mut entries: Vec<(&String, &AnyJson)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, value) in entries {
                sorted.insert(key.clone(), canonicalize(value));
            }
            AnyJson::Object(sorted)
        }
        AnyJson::Array(items) => AnyJson::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Serialize `value` into its canonical string form.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = canonicalize(&serde_json::to_value(value)?);

    let mut buf = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, AsciiFormatter);
    value.serialize(&mut serializer)?;

    Ok(String::from_utf8(buf)?)
}

/// Compact formatter that escapes everything outside printable ASCII.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(python_float_repr(&format!("{value:e}")).as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(python_float_repr(&format!("{value:e}")).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.bytes().all(|b| b.is_ascii() && b != 0x7f) {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() && ch != '\x7f' {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Rewrite Rust's shortest `{:e}` rendering of a finite float into Python's
/// `repr` layout. Both pick the same shortest round-trip digits.
fn python_float_repr(scientific: &str) -> String {
    let (sign, unsigned) = match scientific.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", scientific),
    };
    let (mantissa, exponent) = unsigned.split_once('e').unwrap_or((unsigned, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..16).contains(&exponent) {
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exp_sign}{:02}", exponent.unsigned_abs());
    }

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        return format!("{sign}0.{zeros}{digits}");
    }

    let point = exponent as usize + 1;
    if digits.len() > point {
        format!("{sign}{}.{}", &digits[..point], &digits[point..])
    } else {
        format!("{sign}{digits}{}.0", "0".repeat(point - digits.len()))
    }
}
