//! First-matching-alias lookups over loosely shaped JSON objects.
//!
//! The agent is asked for a fixed schema but may rename keys or change
//! value shapes. Each logical field lists its accepted key names in
//! priority order; the first key holding a usable value wins.

use serde_json::{Map, Value};

/// Return the first non-blank text found under any of `keys`.
pub(crate) fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| obj.get(*key).and_then(text_of))
}

/// Return the first array found under any of `keys`.
///
/// A lone object or string under the key is treated as a one-element list.
pub(crate) fn first_list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<Value> {
    for key in keys {
        match obj.get(*key) {
            Some(Value::Array(items)) => return items.clone(),
            Some(v @ (Value::Object(_) | Value::String(_))) => return vec![v.clone()],
            _ => continue,
        }
    }
    Vec::new()
}

/// Coerce a scalar-ish value into trimmed, non-blank text.
///
/// Strings are taken as-is, numbers and booleans are stringified, and
/// arrays of text are joined with spaces. Objects and nulls yield nothing.
pub(crate) fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(text_of)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}
