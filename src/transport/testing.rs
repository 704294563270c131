// In-memory transport for unit tests.
// Records every call and answers from a programmable map of remote values.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::sync::{Notify, mpsc};

use crate::error::{KvError, Result};

use super::Transport;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Fetch(String),
    Put(String, Value),
    Del(String),
}

#[derive(Debug, Default)]
struct Inner {
    remote: HashMap<String, Value>,
    failing: HashSet<String>,
    gates: HashMap<String, Arc<Notify>>,
    retain_on_delete: bool,
    calls: Vec<Call>,
}

/// Transport double. Unknown paths answer 404; failing paths answer 503.
pub(crate) struct RecordingTransport {
    inner: Mutex<Inner>,
    notify: Option<mpsc::UnboundedSender<Call>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            notify: None,
        }
    }

    /// Also stream each call to the returned receiver.
    pub(crate) fn with_notify() -> (Self, mpsc::UnboundedReceiver<Call>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut transport = Self::new();
        transport.notify = Some(tx);
        (transport, rx)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set_remote(&self, path: &str, value: Value) {
        self.lock().remote.insert(path.to_string(), value);
    }

    pub(crate) fn fail(&self, path: &str) {
        self.lock().failing.insert(path.to_string());
    }

    /// Hold GETs of `path` until the returned notify is signalled once per GET.
    pub(crate) fn gate(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().gates.insert(path.to_string(), Arc::clone(&gate));
        gate
    }

    /// Record DELETEs without applying them, like a remote that lags behind.
    pub(crate) fn retain_on_delete(&self) {
        self.lock().retain_on_delete = true;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn fetch_count(&self, path: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::Fetch(p) if p == path))
            .count()
    }

    fn record(&self, call: Call) -> Result<()> {
        let path = match &call {
            Call::Fetch(p) | Call::Put(p, _) | Call::Del(p) => p.clone(),
        };
        let failing = {
            let mut inner = self.lock();
            inner.calls.push(call.clone());
            inner.failing.contains(&path)
        };
        if let Some(tx) = &self.notify {
            let _ = tx.send(call);
        }
        if failing {
            return Err(unavailable(&path));
        }
        Ok(())
    }
}

fn unavailable(path: &str) -> KvError {
    KvError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        url: path.to_string(),
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn fetch(&self, path: &str) -> Result<Value> {
        self.record(Call::Fetch(path.to_string()))?;
        let gate = self.lock().gates.get(path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.lock().remote.get(path) {
            Some(value) => Ok(json!({ "value": value })),
            None => Err(KvError::Status {
                status: StatusCode::NOT_FOUND,
                url: path.to_string(),
            }),
        }
    }

    async fn put(&self, path: &str, body: &Value) -> Result<()> {
        self.record(Call::Put(path.to_string(), body.clone()))?;
        let value = body.get("value").cloned().unwrap_or(Value::Null);
        self.lock().remote.insert(path.to_string(), value);
        Ok(())
    }

    async fn del(&self, path: &str) -> Result<()> {
        self.record(Call::Del(path.to_string()))?;
        let mut inner = self.lock();
        if !inner.retain_on_delete {
            inner.remote.remove(path);
        }
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        self.record(Call::Fetch(path.to_string()))?;
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut keys: Vec<String> = self
            .lock()
            .remote
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix).map(str::to_string))
            .collect();
        keys.sort();
        Ok(keys)
    }
}
