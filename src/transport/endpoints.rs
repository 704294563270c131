// Request paths and body encoding for the key-value service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire shape of a stored value: `{"value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueEnvelope {
    pub value: Value,
}

impl ValueEnvelope {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn into_json(self) -> Value {
        serde_json::json!({ "value": self.value })
    }
}

/// `{base_path}/{key}`, with the key percent-encoded as a single path segment.
///
/// Everything outside the unreserved set is escaped, so `/`, `#`, `%` and
/// spaces in a key never change which resource is addressed.
pub fn key_path(base_path: &str, key: &str) -> String {
    format!("{}/{}", base_path, urlencoding::encode(key))
}

/// The collection itself, used for key listings.
pub fn collection_path(base_path: &str) -> String {
    if base_path.is_empty() {
        "/".to_string()
    } else {
        base_path.to_string()
    }
}

/// Take the `value` field out of an enveloped body; other bodies are the value.
pub fn unwrap_value(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("value") => {
            map.remove("value").unwrap_or(Value::Null)
        }
        other => other,
    }
}
