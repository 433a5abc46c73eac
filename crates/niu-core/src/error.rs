//! Error types for field mapping

use thiserror::Error;

/// A field lookup the raw payload could not satisfy.
///
/// Anomalies are logged and converted to null at the mapping boundary;
/// they never abort a refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingAnomaly {
    /// An intermediate or leaf object key was absent
    #[error("missing key `{0}`")]
    MissingKey(&'static str),

    /// A path indexed past the end of an array (e.g. an empty trip list)
    #[error("index {0} out of bounds")]
    IndexOutOfBounds(usize),

    /// A node had a different JSON type than the path or transform expects
    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    /// An epoch-millisecond value outside chrono's representable range
    #[error("timestamp {0} outside representable range")]
    InvalidTimestamp(i64),

    /// A negative riding-time duration
    #[error("negative duration {0}")]
    NegativeDuration(i64),
}

/// JSON type name for anomaly messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
