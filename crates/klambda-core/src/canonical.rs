//! # Canonical Payload Normalization
//!
//! Caller data reaches the validator as an arbitrary `Serialize` value: a
//! typed payload struct, a `serde_json::Value` built by a transport layer,
//! or a plain map. Before schema evaluation it is turned into the generic
//! JSON tree the schema engine expects.
//!
//! ## Pipeline
//!
//! 1. Serialize with RFC 8785 canonical JSON (`serde_jcs`): sorted keys,
//!    compact separators, deterministic bytes.
//! 2. Parse the bytes back into a `serde_json::Value`.
//! 3. Normalize numbers: a float with no fractional part that fits an
//!    `i64`/`u64` becomes an integer, so a producer that wrote `3.0` for a
//!    replica count sees the same result as one that wrote `3`.
//!
//! Any failure in steps 1–2 is reported as a [`CanonicalizationError`],
//! never a panic. Step 3 cannot fail.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::CanonicalizationError;

/// Largest float magnitude that converts to an integer without losing
/// precision (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Normalize any serializable value into a canonical JSON tree.
///
/// # Errors
///
/// Returns `CanonicalizationError::Marshal` if the value cannot be
/// serialized (for example a map with non-string keys), and
/// `CanonicalizationError::Unmarshal` if the canonical bytes do not parse
/// back.
pub fn normalize(obj: &(impl Serialize + ?Sized)) -> Result<Value, CanonicalizationError> {
    let bytes = canonical_bytes(obj)?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(CanonicalizationError::Unmarshal)?;
    Ok(normalize_numbers(value))
}

/// Serialize a value to canonical JSON bytes.
///
/// # Errors
///
/// Returns `CanonicalizationError::Marshal` on serialization failure.
pub fn canonical_bytes(obj: &(impl Serialize + ?Sized)) -> Result<Vec<u8>, CanonicalizationError> {
    serde_jcs::to_vec(&obj).map_err(CanonicalizationError::Marshal)
}

/// Recursively rewrite integral floats as integers.
pub fn normalize_numbers(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(normalize_number(n)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_numbers(v)))
                .collect(),
        ),
        other => other,
    }
}

fn normalize_number(n: Number) -> Number {
    if n.is_i64() || n.is_u64() {
        return n;
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            if f < 0.0 {
                Number::from(f as i64)
            } else {
                Number::from(f as u64)
            }
        }
        _ => n,
    }
}
