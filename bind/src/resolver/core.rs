//! Type inference for plain scalars following the YAML 1.2 core schema.
//!
//! This is the inference the parsing engine applies to untagged scalars. The resolver consults it
//! before any registered implicit resolver.

use crate::tag;

/// The type the core schema gives a plain scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreType {
    /// `~`, `null`, `Null`, `NULL`.
    Null,
    /// `true` / `false` in their three capitalizations.
    Bool,
    /// Decimal, `0x` hexadecimal or `0o` octal integers.
    Int,
    /// Floating points, including `.inf` and `.nan`.
    Float,
    /// Anything else.
    Str,
}

impl CoreType {
    /// Return the tag values of this type resolve to.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            CoreType::Null => tag::NULL,
            CoreType::Bool => tag::BOOL,
            CoreType::Int => tag::INT,
            CoreType::Float => tag::FLOAT,
            CoreType::Str => tag::STR,
        }
    }
}

/// Infer the type of a plain scalar.
///
/// This function cannot fail. It falls back to [`CoreType::Str`] if everything else fails.
#[must_use]
pub fn infer(v: &str) -> CoreType {
    // `from_str_radix` accepts a sign, which is not allowed after the prefix.
    if let Some(number) = v.strip_prefix("0x") {
        if is_radix_number(number, 16) {
            return CoreType::Int;
        }
    } else if let Some(number) = v.strip_prefix("0o") {
        if is_radix_number(number, 8) {
            return CoreType::Int;
        }
    }
    match v {
        "~" | "null" | "Null" | "NULL" => CoreType::Null,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => CoreType::Bool,
        _ if is_decimal_integer(v) => CoreType::Int,
        _ if parse_core_schema_fp(v).is_some() => CoreType::Float,
        _ => CoreType::Str,
    }
}

/// Whether `v` is a non-empty sequence of digits in the given radix.
fn is_radix_number(v: &str, radix: u32) -> bool {
    !v.is_empty() && v.chars().all(|c| c.is_digit(radix))
}

/// Whether `v` is an optionally signed sequence of decimal digits.
///
/// Out of range integers still count: they fail at construction instead of silently turning into
/// floats.
fn is_decimal_integer(v: &str) -> bool {
    let digits = v.strip_prefix(['-', '+']).unwrap_or(v);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parse the given string as a floating point according to the core schema.
///
/// See [10.2.1.4](https://yaml.org/spec/1.2.2/#10214-floating-point) for the floating point
/// definition.
///
/// # Return
/// Returns `Some` if parsing succeeding, `None` otherwise.
#[must_use]
pub fn parse_core_schema_fp(v: &str) -> Option<f64> {
    match v {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        // Test that `v` contains a digit so as not to pass in strings like `inf`,
        // which rust will parse as a float.
        _ if v.as_bytes().iter().any(u8::is_ascii_digit) => v.parse::<f64>().ok(),
        _ => None,
    }
}
