//! Loosely typed field maps used for cell edits and partial updates.

use serde_json::Value;

/// Partial or complete set of entity fields, keyed by storage key.
pub type FieldMap = serde_json::Map<String, Value>;

/// A single field value.
pub type FieldValue = Value;

/// Fields that carry system metadata rather than user content.
pub const TIMESTAMP_KEYS: [&str; 2] = ["createdAt", "updatedAt"];

/// Render a field value as plain text (strings without quotes, null as empty).
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Parse command-line style input: JSON when it parses, a plain string otherwise.
pub fn parse_loose(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}
