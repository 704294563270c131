// Key validation.
// A key must be a non-empty string without the `?` query delimiter that
// also survives URL path normalization.

use std::fmt;

use serde_json::Value;

use crate::error::{KvError, Result};

/// Reserved because it would start a query string in the request path.
pub const RESERVED_DELIMITER: char = '?';

/// A key that has passed validation and is safe to embed in a request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    /// Validate a candidate key string.
    ///
    /// `.` and `..` are refused as whole keys: URL parsers collapse them even
    /// when percent-encoded, so they would address a different resource.
    pub fn parse(key: &str) -> Result<Self> {
        if key.is_empty() || key.contains(RESERVED_DELIMITER) || key == "." || key == ".." {
            return Err(KvError::bad_key());
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Key {
    type Error = KvError;

    fn try_from(key: &str) -> Result<Self> {
        Key::parse(key)
    }
}

impl TryFrom<String> for Key {
    type Error = KvError;

    fn try_from(key: String) -> Result<Self> {
        Key::parse(&key)
    }
}

impl TryFrom<&String> for Key {
    type Error = KvError;

    fn try_from(key: &String) -> Result<Self> {
        Key::parse(key)
    }
}

impl TryFrom<Option<&str>> for Key {
    type Error = KvError;

    fn try_from(key: Option<&str>) -> Result<Self> {
        match key {
            Some(key) => Key::parse(key),
            None => Err(KvError::no_key()),
        }
    }
}

/// Keys arriving as dynamic JSON: `null` is a missing key, anything other
/// than a string is not a valid key.
impl TryFrom<&Value> for Key {
    type Error = KvError;

    fn try_from(key: &Value) -> Result<Self> {
        match key {
            Value::Null => Err(KvError::no_key()),
            Value::String(key) => Key::parse(key),
            _ => Err(KvError::bad_key()),
        }
    }
}
