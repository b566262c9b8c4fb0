//! Lenient numeric decoding for model-supplied arguments.
//!
//! Models send `10`, `10.0`, or `"10"` for the same integer, so the typed
//! argument structs decode through these helpers instead of the strict
//! serde defaults.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_f64<E: serde::de::Error>(value: &Value) -> Result<f64, E> {
    let f = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| E::custom(format!("number out of range: {n}")))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("expected a number, got \"{s}\"")))?,
        other => return Err(E::custom(format!("expected a number, got {other}"))),
    };
    // "NaN" and "inf" parse as f64 but cannot be stored or compared
    if !f.is_finite() {
        return Err(E::custom(format!("expected a finite number, got {f}")));
    }
    Ok(f)
}

fn value_to_i64<E: serde::de::Error>(value: &Value) -> Result<i64, E> {
    if let Value::Number(n) = value {
        if let Some(i) = n.as_i64() {
            return Ok(i);
        }
    }
    let f = value_to_f64::<E>(value)?;
    if f.fract() != 0.0 {
        return Err(E::custom(format!("expected a whole number, got {f}")));
    }
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(E::custom(format!("number out of range: {f}")));
    }
    Ok(f as i64)
}

pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(d)?;
    value_to_f64(&value)
}

pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    value_to_i64(&value)
}

pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        value => value_to_f64(&value).map(Some),
    }
}

pub fn opt_integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        value => value_to_i64(&value).map(Some),
    }
}

/// Treat a missing, null, or blank string as absent.
pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        other => Err(D::Error::custom(format!("expected a string, got {other}"))),
    }
}
