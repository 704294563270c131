//! Cached, write-through accessors for a remote HTTP key-value service.
//!
//! [`KvClient`] hands out [`KeyHandle`]s. Reading a handle returns the
//! last-known value from a local cache, writing it updates the cache and
//! PUTs the value in the background, and removing it deletes locally and
//! remotely. With a sync interval configured, every cached key is
//! re-fetched periodically.
//!
//! ```no_run
//! use ezkv::{KvClient, KvConfig};
//!
//! # async fn demo() -> ezkv::Result<()> {
//! let client = KvClient::new(KvConfig::new("api.example.com").with_base_path("/kv"))?;
//! let color = client.accessor("color").await?;
//! color.write("blue")?;
//! assert_eq!(color.read(), Some(serde_json::json!("blue")));
//! color.remove();
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod cache;
pub mod config;
pub mod error;
pub mod sync;
pub mod transport;

pub use accessor::{KeyHandle, KvClient};
pub use cache::{CacheStore, CachedValue, Key};
pub use config::KvConfig;
pub use error::{KvError, Result};
pub use sync::{SyncMetrics, SyncScheduler};
pub use transport::{HttpTransport, Transport};
