//! Key/value backend modelled on browser local storage.
//!
//! Collections live under `tms_<name>` keys in an in-memory map. When opened
//! with a path, the whole map is rewritten to that file after every change,
//! which makes it usable as the offline cache behind [`FallbackStore`].
//!
//! [`FallbackStore`]: crate::FallbackStore

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::collection::{empty_for, validate_name};
use crate::errors::Result;
use crate::file::write_json_atomic;
use crate::gateway::PersistenceGateway;

/// Key prefix for every stored collection.
const KEY_PREFIX: &str = "tms_";

fn key_for(name: &str) -> String {
    format!("{KEY_PREFIX}{}", name.to_lowercase())
}

/// In-memory key/value store with optional file mirroring.
pub struct LocalStore {
    entries: RwLock<BTreeMap<String, Value>>,
    path: Option<PathBuf>,
    // Serializes snapshot writes so the file never goes backwards.
    flush_lock: tokio::sync::Mutex<()>,
}

impl LocalStore {
    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            path: None,
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Store mirrored to `path`, loading existing entries if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "opened local store");
        Ok(Self {
            entries: RwLock::new(entries),
            path: Some(path),
            flush_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.flush_lock.lock().await;
        let snapshot = Value::Object(
            self.entries
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        write_json_atomic(path, &snapshot).await
    }
}

#[async_trait]
impl PersistenceGateway for LocalStore {
    async fn read_collection(&self, name: &str) -> Result<Value> {
        validate_name(name)?;
        let entries = self.entries.read();
        Ok(entries
            .get(&key_for(name))
            .cloned()
            .unwrap_or_else(|| empty_for(name)))
    }

    async fn write_collection(&self, name: &str, value: &Value) -> Result<()> {
        validate_name(name)?;
        let _ = self.entries.write().insert(key_for(name), value.clone());
        self.flush().await
    }

    async fn delete_collection(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        let existed = self.entries.write().remove(&key_for(name)).is_some();
        if existed {
            self.flush().await?;
        }
        Ok(existed)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self
            .entries
            .read()
            .keys()
            .filter_map(|k| k.strip_prefix(KEY_PREFIX).map(String::from))
            .collect())
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use serde_json::json;

    #[tokio::test]
    async fn in_memory_round_trip() {
        let store = LocalStore::in_memory();
        assert_eq!(store.read(Collection::Projects).await.unwrap(), json!([]));
        store
            .write(Collection::Projects, &json!([{"id": "proj-1"}]))
            .await
            .unwrap();
        assert_eq!(
            store.read(Collection::Projects).await.unwrap(),
            json!([{"id": "proj-1"}])
        );
        assert_eq!(store.list_collections().await.unwrap(), vec!["projects"]);
        assert!(store.path().is_none());
    }

    #[tokio::test]
    async fn keys_use_tms_prefix_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("local_storage.json");
        let store = LocalStore::open(&path).await.unwrap();
        store.write_collection("tasks", &json!([])).await.unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, json!({"tms_tasks": []}));
    }

    #[tokio::test]
    async fn reopen_restores_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        {
            let store = LocalStore::open(&path).await.unwrap();
            store
                .write_collection("settings", &json!({"theme": "dark"}))
                .await
                .unwrap();
        }
        let store = LocalStore::open(&path).await.unwrap();
        assert_eq!(
            store.read_collection("settings").await.unwrap(),
            json!({"theme": "dark"})
        );
    }

    #[tokio::test]
    async fn delete_missing_is_false() {
        let store = LocalStore::in_memory();
        assert!(!store.delete_collection("tasks").await.unwrap());
        store.write_collection("tasks", &json!([])).await.unwrap();
        assert!(store.delete_collection("tasks").await.unwrap());
    }
}
