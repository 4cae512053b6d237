//! Persistence backend and timer settings.

use serde::{Deserialize, Serialize};

/// Where the CLI keeps its collections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// JSON files in the storage directory.
    #[default]
    File,
    /// A running file server, with a local cache when it is unreachable.
    Remote,
    /// A single key/value file, like browser local storage.
    Local,
}

impl StorageMode {
    /// Parse a mode name (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "remote" => Some(Self::Remote),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Persistence backend settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Backend selection.
    pub mode: StorageMode,
    /// File server base URL (remote mode).
    pub api_url: String,
    /// Request timeout for the remote backend.
    pub timeout_ms: u64,
    /// Offline cache directory (relative to `~/.ptms`).
    pub cache_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            mode: StorageMode::File,
            api_url: "http://localhost:3000/api".to_string(),
            timeout_ms: 5000,
            cache_dir: "cache".to_string(),
        }
    }
}

/// Active-timer display settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    /// How often the running timer is re-read for display.
    pub tick_interval_ms: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}
