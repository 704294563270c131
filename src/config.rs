// Client configuration.
// Host, base path, and background sync interval, loadable from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};

/// Connection and sync settings for one remote key-value collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvConfig {
    /// Service host, with or without a scheme (`https://` is assumed).
    pub host: String,
    /// Path prefix for the collection, e.g. `/kv`.
    #[serde(default)]
    pub base_path: String,
    /// Background refresh interval in milliseconds; 0 disables it.
    #[serde(default)]
    pub sync_interval_ms: u64,
}

impl KvConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            base_path: String::new(),
            sync_interval_ms: 0,
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Non-zero intervals shorter than a millisecond round up to 1 ms.
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.sync_interval_ms = if millis == 0 && !interval.is_zero() {
            1
        } else {
            millis
        };
        self
    }

    /// Reject configurations that cannot address a service.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(KvError::Config("no host given".to_string()));
        }
        Ok(())
    }

    /// The refresh period, or `None` when background sync is off.
    pub fn sync_interval(&self) -> Option<Duration> {
        (self.sync_interval_ms > 0).then(|| Duration::from_millis(self.sync_interval_ms))
    }

    /// Scheme and host, without a trailing slash.
    pub fn origin(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }

    /// Base path normalized to a leading slash and no trailing slash.
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Read and validate a JSON config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: KvConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Platform config location (~/.config/ezkv/config.json on Linux).
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ezkv").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load from [`KvConfig::default_path`].
    pub fn load() -> Result<Self> {
        let path = Self::default_path()
            .ok_or_else(|| KvError::Config("no config directory available".to_string()))?;
        Self::from_path(&path)
    }
}
