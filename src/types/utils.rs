//! Shared utility functions for loosely-typed JSON.
//!
//! ## JSON Coercion Helpers
//!
//! Agent payloads carry scalars where lists are expected, numbers as strings
//! and the occasional `null` or empty string. These helpers give each of
//! those a single, predictable reading:
//! - `is_truthy` - presence test used by text fallbacks and list filtering
//! - `coerce_string`, `coerce_number` - scalar coercion
//! - `as_list`, `truthy_strings`, `stringify_list` - scalar-or-list coercion
//! - `dedup_strings` - order-preserving dedup with empty-entry removal

use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Display;

// =============================================================================
// JSON Value Coercion
// =============================================================================

/// `false` for `null`, `false`, `0`, NaN and `""`; `true` for everything else,
/// including empty arrays and objects.
#[inline]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a JSON value as text.
///
/// Strings are returned verbatim, numbers without a spurious `.0`, and
/// structured values as compact JSON.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                format_number(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Coerce a JSON value to a finite number.
///
/// Numeric strings are parsed after trimming, booleans count as 1/0, and
/// everything else (including non-finite results) collapses to 0.
pub fn coerce_number(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };

    if number.is_finite() { number } else { 0.0 }
}

/// Format a number, dropping the fractional part when it is zero.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Treat a scalar as a one-element list.
///
/// Falsy scalars (`null`, `""`, `0`, `false`) yield an empty list.
pub fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other if is_truthy(other) => vec![other],
        _ => Vec::new(),
    }
}

/// Scalar-or-list to strings, dropping falsy entries before conversion.
pub fn truthy_strings(value: &Value) -> Vec<String> {
    as_list(value)
        .into_iter()
        .filter(|v| is_truthy(v))
        .map(coerce_string)
        .collect()
}

/// Scalar-or-list to strings, converting every entry.
///
/// `null`, `false` and `0` inside a list survive as `"null"`, `"false"` and
/// `"0"`; only `""` is left for `dedup_strings` to drop.
pub fn stringify_list(value: &Value) -> Vec<String> {
    as_list(value).into_iter().map(coerce_string).collect()
}

/// Drop empty strings and duplicates, keeping the first occurrence.
pub fn dedup_strings<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

// =============================================================================
// Result Filtering
// =============================================================================

/// Log and discard an error, keeping successful values.
///
/// Used with `filter_map` when a corrupt row should not fail the whole query.
pub fn log_filter_error<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}: {}", context, e);
            None
        }
    }
}
