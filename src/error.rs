// Error types for ezkv.
// Covers key/value validation, transport failures, and configuration errors.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KvError {
    #[error("{0}")]
    InvalidKey(String),

    #[error("no valid value specified")]
    InvalidValue,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("invalid json-response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no tokio runtime available to dispatch background work")]
    NoRuntime,
}

impl KvError {
    pub(crate) fn no_key() -> Self {
        KvError::InvalidKey("no key specified".to_string())
    }

    pub(crate) fn bad_key() -> Self {
        KvError::InvalidKey("key is not a valid string".to_string())
    }

    /// Transport-level failure, including non-success statuses.
    pub fn is_network(&self) -> bool {
        matches!(self, KvError::Network(_) | KvError::Status { .. })
    }

    /// Response body was not valid JSON.
    pub fn is_parse(&self) -> bool {
        matches!(self, KvError::Parse(_))
    }
}

pub type Result<T> = std::result::Result<T, KvError>;
