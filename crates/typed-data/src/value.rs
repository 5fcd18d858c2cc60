//! Coercion of JSON leaves into typed scalars.
//!
//! Integers may arrive as JSON numbers of any size, decimal strings or `0x`
//! hex strings. Byte strings must be `0x` hex.
//! Nothing is coerced across shapes: a bool is never an integer and a
//! non-hex string is never bytes.

use alloy_primitives::U256;
use serde_json::Value;

use crate::error::TypedDataError;

/// Short name of a JSON value's shape, for error messages.
pub(crate) fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn expect_str<'a>(
    value: &'a Value,
    path: &str,
    ty: &str,
) -> Result<&'a str, TypedDataError> {
    value.as_str().ok_or_else(|| {
        TypedDataError::mismatch(path, format!("expected a string for {ty}, got {}", shape(value)))
    })
}

pub(crate) fn expect_bool(value: &Value, path: &str) -> Result<bool, TypedDataError> {
    value.as_bool().ok_or_else(|| {
        TypedDataError::mismatch(path, format!("expected a bool, got {}", shape(value)))
    })
}

/// Decodes a `0x`-prefixed hex string.
pub(crate) fn parse_hex_bytes(value: &Value, path: &str, ty: &str) -> Result<Vec<u8>, TypedDataError> {
    let s = expect_str(value, path, ty)?;
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| TypedDataError::mismatch(path, format!("{ty} value must be 0x-prefixed hex")))?;
    hex::decode(digits)
        .map_err(|e| TypedDataError::mismatch(path, format!("invalid hex for {ty}: {e}")))
}

/// A parsed integer as sign and magnitude.
struct Integer {
    magnitude: U256,
    negative: bool,
}

fn parse_integer(value: &Value, path: &str, ty: &str) -> Result<Integer, TypedDataError> {
    match value {
        // Numbers keep their source text, so any width is exact. Fractions
        // and exponents fail the digit check.
        Value::Number(n) => parse_integer_str(&n.to_string(), path, ty),
        Value::String(s) => parse_integer_str(s, path, ty),
        other => Err(TypedDataError::mismatch(
            path,
            format!("expected an integer for {ty}, got {}", shape(other)),
        )),
    }
}

fn parse_integer_str(s: &str, path: &str, ty: &str) -> Result<Integer, TypedDataError> {
    let not_numeric =
        || TypedDataError::mismatch(path, format!("expected an integer for {ty}, got \"{s}\""));

    let (digits, radix, negative) = if let Some(hex) =
        s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
    {
        (hex, 16u64, false)
    } else if let Some(dec) = s.strip_prefix('-') {
        (dec, 10, true)
    } else {
        (s, 10, false)
    };

    let valid = match radix {
        16 => digits.bytes().all(|b| b.is_ascii_hexdigit()),
        _ => digits.bytes().all(|b| b.is_ascii_digit()),
    };
    if digits.is_empty() || !valid {
        return Err(not_numeric());
    }

    // Digits are well formed, so a parse failure means more than 256 bits.
    let magnitude =
        U256::from_str_radix(digits, radix).map_err(|_| TypedDataError::overflow(path, ty))?;

    Ok(Integer {
        magnitude,
        negative,
    })
}

/// Parses an unsigned integer that must fit in `bits`.
pub(crate) fn parse_uint(value: &Value, bits: usize, path: &str) -> Result<U256, TypedDataError> {
    let ty = format!("uint{bits}");
    let int = parse_integer(value, path, &ty)?;
    if int.negative && !int.magnitude.is_zero() {
        return Err(TypedDataError::overflow(path, ty));
    }
    if int.magnitude.bit_len() > bits {
        return Err(TypedDataError::overflow(path, ty));
    }
    Ok(int.magnitude)
}

/// Parses a signed integer that must fit in `bits` as two's complement.
///
/// Returns the magnitude and sign; see [`crate::word::int_word`].
pub(crate) fn parse_int(
    value: &Value,
    bits: usize,
    path: &str,
) -> Result<(U256, bool), TypedDataError> {
    let ty = format!("int{bits}");
    let int = parse_integer(value, path, &ty)?;

    // Range is [-2^(bits-1), 2^(bits-1)).
    let fits = if int.negative {
        int.magnitude.bit_len() < bits || int.magnitude == U256::from(1u8) << (bits - 1)
    } else {
        int.magnitude.bit_len() < bits
    };
    if !fits {
        return Err(TypedDataError::overflow(path, ty));
    }

    Ok((int.magnitude, int.negative))
}
