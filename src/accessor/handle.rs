// Per-key handle.
// Synchronous reads from the cache; write-through and delete-through to the remote service.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::cache::Key;
use crate::error::{KvError, Result};
use crate::transport::ValueEnvelope;

use super::Shared;

/// A view of one cached key. Cloning is cheap and clones observe the same entry.
///
/// Remote PUTs and DELETEs are dispatched in issuance order but may complete
/// in any order, so after rapid successive writes the remote value can differ
/// from the local one. The local cache always reflects the last call made.
#[derive(Clone)]
pub struct KeyHandle {
    key: Key,
    shared: Arc<Shared>,
}

impl KeyHandle {
    pub(crate) fn new(key: Key, shared: Arc<Shared>) -> Self {
        Self { key, shared }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The last-known value. Never touches the network.
    pub fn read(&self) -> Option<Value> {
        self.shared
            .with_cache(|cache| cache.get(self.key.as_str()))
            .filter(|value| !value.is_null())
    }

    /// Whether the key currently has a cache entry.
    pub fn is_loaded(&self) -> bool {
        self.shared.with_cache(|cache| cache.has(self.key.as_str()))
    }

    /// When the current value was cached.
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.shared
            .with_cache(|cache| cache.entry(self.key.as_str()).map(|entry| entry.cached_at))
    }

    /// Update the cache now and send the value to the service in the background.
    ///
    /// `null` is rejected; use [`KeyHandle::remove`] to clear a key.
    pub fn write(&self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if value.is_null() {
            return Err(KvError::InvalidValue);
        }

        self.shared
            .with_cache(|cache| cache.set(self.key.as_str(), value.clone()));
        debug!(key = %self.key, "cached local write");

        self.shared
            .dispatch_put(&self.key, ValueEnvelope::new(value).into_json());
        Ok(())
    }

    /// Drop the key from the cache now and delete it remotely in the background.
    pub fn remove(&self) {
        self.shared
            .with_cache(|cache| cache.delete(self.key.as_str()));
        debug!(key = %self.key, "removed from cache");

        self.shared.dispatch_delete(&self.key);
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandle")
            .field("key", &self.key)
            .field("value", &self.read())
            .finish()
    }
}
