// Transport module.
// The network seam consumed by the accessor layer, plus its reqwest implementation.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub mod client;
pub mod endpoints;
#[cfg(test)]
pub(crate) mod testing;

pub use client::HttpTransport;
pub use endpoints::{ValueEnvelope, collection_path, key_path, unwrap_value};

/// GET/PUT/DELETE against paths relative to the configured host.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` and decode the body as JSON.
    async fn fetch(&self, path: &str) -> Result<Value>;

    /// PUT `body` as JSON to `path`.
    async fn put(&self, path: &str, body: &Value) -> Result<()>;

    /// DELETE `path`.
    async fn del(&self, path: &str) -> Result<()>;

    /// GET a collection listing at `path`.
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let body = self.fetch(path).await?;
        Ok(serde_json::from_value(body)?)
    }
}
