//! Ordered-fallback lookups over loosely structured entries.
//!
//! Definition files are written by hand by different people, so the same fact
//! shows up under different keys (`description`, `content`, `detail`). These
//! helpers pick the first usable candidate.

use serde_json::Value;

/// Returns the first value under `keys` that is not null and, for strings, not
/// blank. Strings are returned trimmed.
pub fn coalesce(entry: &Value, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|key| match entry.get(*key)? {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
        }
        other => Some(other.clone()),
    })
}

/// Like [`coalesce`], but renders the result as text.
///
/// Numbers and booleans are accepted and formatted; arrays and objects are
/// treated as unusable.
pub fn coalesce_text(entry: &Value, keys: &[&str]) -> Option<String> {
    coalesce(entry, keys).and_then(|value| value_to_text(&value))
}

pub(crate) fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Whether `value` should be treated as "not provided": null, an empty or blank
/// string, an empty array or an empty object.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
