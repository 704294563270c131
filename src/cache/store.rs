// In-memory cache store.
// Maps each key to its last-known value and when that value was cached.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A cached value with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    /// The last-known value.
    pub value: Value,
    /// When the value was cached.
    pub cached_at: DateTime<Utc>,
}

impl CachedValue {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
        }
    }
}

/// Initial loads for one key still waiting on the network.
#[derive(Debug, Default)]
struct PendingLoad {
    waiters: usize,
    removed: bool,
}

/// Key to last-known value. Every operation is synchronous.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: HashMap<String, CachedValue>,
    pending: HashMap<String, PendingLoad>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Full entry for `key`, including its timestamp.
    pub fn entry(&self, key: &str) -> Option<&CachedValue> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), CachedValue::new(value));
    }

    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
        if let Some(pending) = self.pending.get_mut(key) {
            pending.removed = true;
        }
    }

    /// Register an initial load for `key` that is about to hit the network.
    pub fn begin_load(&mut self, key: &str) {
        self.pending.entry(key.to_string()).or_default().waiters += 1;
    }

    /// Close a load opened with [`CacheStore::begin_load`]. Returns true when
    /// `key` was deleted while the load was in flight.
    pub fn finish_load(&mut self, key: &str) -> bool {
        let Some(pending) = self.pending.get_mut(key) else {
            return false;
        };
        let removed = pending.removed;
        pending.waiters = pending.waiters.saturating_sub(1);
        if pending.waiters == 0 {
            self.pending.remove(key);
        }
        removed
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Owned snapshot of the keys; later mutation does not affect it.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let mut store = CacheStore::new();
        assert!(store.is_empty());

        store.set("color", json!("red"));
        assert!(store.has("color"));
        assert_eq!(store.get("color"), Some(json!("red")));
        assert_eq!(store.len(), 1);

        store.set("color", json!({"r": 255}));
        assert_eq!(store.get("color"), Some(json!({"r": 255})));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut store = CacheStore::new();
        store.set("a", json!(1));
        store.delete("a");

        assert!(!store.has("a"));
        assert_eq!(store.get("a"), None);

        // Deleting a missing key is a no-op
        store.delete("a");
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_is_a_snapshot() {
        let mut store = CacheStore::new();
        store.set("a", json!(1));
        store.set("b", json!(2));

        let mut keys = store.keys();
        store.set("c", json!(3));
        store.delete("a");

        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_delete_during_load_is_reported() {
        let mut store = CacheStore::new();
        store.begin_load("a");
        store.delete("a");
        assert!(store.finish_load("a"));

        // Bookkeeping is cleared once the last load finishes
        store.begin_load("a");
        assert!(!store.finish_load("a"));
        assert!(!store.finish_load("a"));
    }

    #[test]
    fn test_overlapping_loads_share_removal() {
        let mut store = CacheStore::new();
        store.begin_load("a");
        store.begin_load("a");
        store.delete("a");

        assert!(store.finish_load("a"));
        assert!(store.finish_load("a"));

        // Deletes of other keys do not count
        store.begin_load("b");
        store.delete("a");
        assert!(!store.finish_load("b"));
    }

    #[test]
    fn test_entry_timestamp() {
        let before = Utc::now();
        let mut store = CacheStore::new();
        store.set("a", json!(true));

        let entry = store.entry("a").unwrap();
        assert!(entry.cached_at >= before);
        assert_eq!(entry.value, json!(true));
    }
}
