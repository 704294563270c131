// Key accessor factory.
// Owns the cache store and transport for one host/base-path pair and hands out key handles.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::runtime::Handle as RuntimeHandle;
use tracing::{debug, warn};

use crate::cache::{CacheStore, Key};
use crate::config::KvConfig;
use crate::error::{KvError, Result};
use crate::sync::{SyncMetrics, SyncScheduler};
use crate::transport::{HttpTransport, Transport, collection_path, key_path, unwrap_value};

pub mod handle;

pub use handle::KeyHandle;

/// State shared by the client, its handles, and the sync loop.
pub(crate) struct Shared {
    cache: Mutex<CacheStore>,
    pub(crate) transport: Arc<dyn Transport>,
    base_path: String,
    pub(crate) runtime: RuntimeHandle,
}

impl Shared {
    /// Run `f` with exclusive access to the cache. Never held across an await.
    pub(crate) fn with_cache<R>(&self, f: impl FnOnce(&mut CacheStore) -> R) -> R {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut cache)
    }

    pub(crate) fn path(&self, key: &str) -> String {
        key_path(&self.base_path, key)
    }

    /// Initial load for a key not yet in the cache. Failures leave it absent.
    async fn load(&self, key: &Key) {
        let path = self.path(key.as_str());
        self.with_cache(|cache| cache.begin_load(key.as_str()));
        let mut guard = LoadGuard {
            shared: self,
            key: key.as_str(),
            armed: true,
        };
        let result = self.transport.fetch(&path).await;
        guard.armed = false;

        match result {
            Ok(body) => {
                let value = unwrap_value(body);
                // Local writes and removes made while the fetch was in flight win.
                let cached = self.with_cache(|cache| {
                    let removed = cache.finish_load(key.as_str());
                    let insert = !removed && !cache.has(key.as_str());
                    if insert {
                        cache.set(key.as_str(), value);
                    }
                    insert
                });
                debug!(key = %key, cached, "initial load finished");
            }
            Err(e) => {
                self.with_cache(|cache| cache.finish_load(key.as_str()));
                warn!(key = %key, error = %e, "initial load failed, value left empty");
            }
        }
    }

    /// Dispatch a PUT without waiting for it.
    pub(crate) fn dispatch_put(&self, key: &Key, body: Value) {
        let transport = Arc::clone(&self.transport);
        let path = self.path(key.as_str());
        let key = key.clone();
        self.runtime.spawn(async move {
            match transport.put(&path, &body).await {
                Ok(()) => debug!(key = %key, "remote write completed"),
                Err(e) => warn!(key = %key, error = %e, "remote write failed"),
            }
        });
    }

    /// Dispatch a DELETE without waiting for it.
    pub(crate) fn dispatch_delete(&self, key: &Key) {
        let transport = Arc::clone(&self.transport);
        let path = self.path(key.as_str());
        let key = key.clone();
        self.runtime.spawn(async move {
            match transport.del(&path).await {
                Ok(()) => debug!(key = %key, "remote delete completed"),
                Err(e) => warn!(key = %key, error = %e, "remote delete failed"),
            }
        });
    }
}

/// Closes the pending-load record if an accessor future is dropped mid-fetch.
struct LoadGuard<'a> {
    shared: &'a Shared,
    key: &'a str,
    armed: bool,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.with_cache(|cache| cache.finish_load(self.key));
        }
    }
}

/// Entry point: creates [`KeyHandle`]s backed by a shared local cache.
///
/// Must be constructed inside a tokio runtime; writes, deletes, and the
/// background sync are spawned onto it. Dropping the client stops the sync
/// timer. Handles already given out keep working against the same cache.
pub struct KvClient {
    config: KvConfig,
    shared: Arc<Shared>,
    scheduler: Option<SyncScheduler>,
}

impl KvClient {
    /// Create a client talking HTTP to `config.host`.
    pub fn new(config: KvConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a caller-supplied transport.
    pub fn with_transport(config: KvConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let runtime = RuntimeHandle::try_current().map_err(|_| KvError::NoRuntime)?;

        let shared = Arc::new(Shared {
            cache: Mutex::new(CacheStore::new()),
            transport,
            base_path: config.normalized_base_path(),
            runtime,
        });

        let scheduler = config
            .sync_interval()
            .map(|period| SyncScheduler::start(Arc::clone(&shared), period));

        Ok(Self {
            config,
            shared,
            scheduler,
        })
    }

    pub fn config(&self) -> &KvConfig {
        &self.config
    }

    /// Validate `key`, load it on first use, and return a handle bound to it.
    ///
    /// Only key validation can fail. A failed initial fetch is logged and the
    /// handle starts out empty.
    pub async fn accessor<K>(&self, key: K) -> Result<KeyHandle>
    where
        K: TryInto<Key, Error = KvError>,
    {
        let key = key.try_into()?;

        if !self.shared.with_cache(|cache| cache.has(key.as_str())) {
            self.shared.load(&key).await;
        }

        Ok(KeyHandle::new(key, Arc::clone(&self.shared)))
    }

    /// List the keys the remote collection holds. Errors are returned as-is.
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let path = collection_path(&self.shared.base_path);
        self.shared.transport.list(&path).await
    }

    /// Snapshot of the keys currently held locally.
    pub fn cached_keys(&self) -> Vec<String> {
        self.shared.with_cache(|cache| cache.keys())
    }

    /// Background sync counters; all zero when sync is disabled.
    pub fn sync_metrics(&self) -> SyncMetrics {
        self.scheduler
            .as_ref()
            .map(SyncScheduler::metrics)
            .unwrap_or_default()
    }

    pub fn is_syncing(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Stop the sync timer and release the client.
    pub fn shutdown(mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop();
        }
    }
}

impl fmt::Debug for KvClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvClient")
            .field("config", &self.config)
            .field("syncing", &self.is_syncing())
            .finish()
    }
}
