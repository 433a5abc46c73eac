//! Recursive redaction of sensitive keys before a snapshot reaches disk.

use serde_json::Value;

/// Mapping keys whose values are never persisted. Matched case-insensitively.
const SENSITIVE_KEYS: &[&str] = &[
    "token",
    "access_token",
    "refresh_token",
    "password",
    "passwd",
    "secret",
    "authorization",
    "auth",
];

/// Replacement written in place of a redacted value.
pub const REDACTION_MARKER: &str = "***REDACTED***";

/// Copy of `value` with every sensitive key's value replaced by the marker.
///
/// Nested objects and arrays are walked; non-sensitive structure is
/// preserved unchanged.
pub fn redacted(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| {
                    if is_sensitive(key) {
                        (key.clone(), Value::String(REDACTION_MARKER.to_string()))
                    } else {
                        (key.clone(), redacted(child))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redacted).collect()),
        other => other.clone(),
    }
}

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEYS
        .iter()
        .any(|sensitive| key.eq_ignore_ascii_case(sensitive))
}
