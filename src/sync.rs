// Background sync.
// Periodically re-fetches every cached key so local values do not drift far from the service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::accessor::Shared;
use crate::transport::unwrap_value;

/// Counters collected by the sync loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetrics {
    /// Timer ticks fired.
    pub ticks: u64,
    /// Entries overwritten with a fresh remote value.
    pub refreshed_total: u64,
    /// Refreshes that failed and left the entry untouched.
    pub errors_total: u64,
    /// When the last tick fired.
    pub last_tick_at: Option<DateTime<Utc>>,
}

type SharedMetrics = Arc<Mutex<SyncMetrics>>;

fn update(metrics: &SharedMetrics, f: impl FnOnce(&mut SyncMetrics)) {
    let mut metrics = metrics.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut metrics);
}

/// Recurring refresh timer. Stops when dropped.
#[derive(Debug)]
pub struct SyncScheduler {
    task: JoinHandle<()>,
    metrics: SharedMetrics,
}

impl SyncScheduler {
    /// Spawn the timer. The first tick fires one full `period` from now.
    pub(crate) fn start(shared: Arc<Shared>, period: Duration) -> Self {
        let metrics = SharedMetrics::default();
        let task = shared
            .runtime
            .clone()
            .spawn(run(shared, period, Arc::clone(&metrics)));
        info!(period_ms = period.as_millis() as u64, "background sync started");

        Self { task, metrics }
    }

    pub fn metrics(&self) -> SyncMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Cancel the timer. Refreshes already in flight still complete.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.task.abort();
        info!("background sync stopped");
    }
}

async fn run(shared: Arc<Shared>, period: Duration, metrics: SharedMetrics) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        tick(&shared, &metrics);
    }
}

/// Snapshot the cached keys and spawn one independent refresh per key.
fn tick(shared: &Arc<Shared>, metrics: &SharedMetrics) {
    let keys = shared.with_cache(|cache| cache.keys());
    update(metrics, |m| {
        m.ticks += 1;
        m.last_tick_at = Some(Utc::now());
    });
    debug!(keys = keys.len(), "sync tick");

    for key in keys {
        let shared_for_task = Arc::clone(shared);
        let metrics = Arc::clone(metrics);
        shared
            .runtime
            .spawn(async move { refresh(&shared_for_task, key, &metrics).await });
    }
}

async fn refresh(shared: &Shared, key: String, metrics: &SharedMetrics) {
    let path = shared.path(&key);
    match shared.transport.fetch(&path).await {
        Ok(body) => {
            let value = unwrap_value(body);
            // Keys removed locally since the snapshot stay removed.
            let refreshed = shared.with_cache(|cache| {
                let present = cache.has(&key);
                if present {
                    cache.set(&key, value);
                }
                present
            });
            if refreshed {
                update(metrics, |m| m.refreshed_total += 1);
                debug!(key = %key, "refreshed");
            }
        }
        Err(e) => {
            update(metrics, |m| m.errors_total += 1);
            warn!(key = %key, error = %e, "refresh failed, keeping cached value");
        }
    }
}
