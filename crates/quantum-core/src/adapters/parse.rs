//! Lenient field coercion shared by the vendor normalizers.
//!
//! Envelopes are typed per vendor; individual records stay loosely typed
//! because vendors disagree on how they spell "no value": missing keys,
//! `null`, empty strings, `"None"`, `"-"`, `"N/A"` and zero all occur. Every
//! helper here folds those into [`Field::Unavailable`].

use serde_json::Value;

use crate::{Field, UtcDateTime};

const PLACEHOLDERS: [&str; 4] = ["none", "-", "n/a", "null"];

pub(crate) fn text(object: &Value, key: &str) -> Field<String> {
    match object.get(key) {
        Some(Value::String(raw)) => clean_text(Some(raw)),
        Some(Value::Number(number)) => Field::Value(number.to_string()),
        _ => Field::Unavailable,
    }
}

/// [`text`] for a string already lifted out of a typed envelope.
pub(crate) fn clean_text(raw: Option<&str>) -> Field<String> {
    match raw.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() && !is_placeholder(trimmed) => {
            Field::Value(trimmed.to_owned())
        }
        _ => Field::Unavailable,
    }
}

/// Positive or negative finite number; zero counts as unavailable.
pub(crate) fn number(object: &Value, key: &str) -> Field<f64> {
    let parsed = match object.get(key) {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => parse_number(raw),
        // Yahoo's raw/fmt wrapper
        Some(Value::Object(wrapper)) => wrapper.get("raw").and_then(Value::as_f64),
        _ => None,
    };

    match parsed {
        Some(value) if value.is_finite() && value != 0.0 => Field::Value(value),
        _ => Field::Unavailable,
    }
}

/// Unix seconds, either bare or wrapped.
pub(crate) fn unix_time(object: &Value, key: &str) -> Field<UtcDateTime> {
    let seconds = match object.get(key) {
        Some(Value::Number(number)) => number.as_i64(),
        Some(Value::String(raw)) => raw.trim().parse::<i64>().ok(),
        Some(Value::Object(wrapper)) => wrapper.get("raw").and_then(Value::as_i64),
        _ => None,
    };

    seconds
        .filter(|seconds| *seconds > 0)
        .and_then(|seconds| UtcDateTime::from_unix_timestamp(seconds).ok())
        .into()
}

/// Strict number used for OHLC columns where a missing value voids the row.
pub(crate) fn required_number(object: &Value, key: &str) -> Option<f64> {
    match object.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => parse_number(raw),
        _ => None,
    }
    .filter(|value| value.is_finite())
}

/// Vendor-supplied message, trimmed; blank counts as absent.
pub(crate) fn non_blank(message: Option<&str>) -> Option<String> {
    message
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%');
    if trimmed.is_empty() || is_placeholder(trimmed) {
        return None;
    }
    trimmed.replace(',', "").parse::<f64>().ok()
}

fn is_placeholder(value: &str) -> bool {
    PLACEHOLDERS
        .iter()
        .any(|placeholder| value.eq_ignore_ascii_case(placeholder))
}
