//! JSON-file backend using `tokio::fs`.
//!
//! One file per collection inside a single directory. The file server uses
//! the file-level methods directly; the gateway methods map a collection
//! name to `<name>.json`.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::collection::{empty_for, validate_name};
use crate::errors::Result;
use crate::gateway::PersistenceGateway;

/// Directory of pretty-printed JSON files.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`. The directory is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the root directory if missing.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        validate_name(file_name)?;
        Ok(self.dir.join(file_name))
    }

    /// All file names in the directory, sorted.
    pub async fn list_files(&self) -> Result<Vec<String>> {
        self.ensure_dir().await?;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Parsed content of a file, or `None` if it does not exist.
    pub async fn read_file(&self, file_name: &str) -> Result<Option<Value>> {
        let path = self.resolve(file_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a value as pretty JSON, replacing the file atomically.
    pub async fn write_file(&self, file_name: &str, value: &Value) -> Result<()> {
        let path = self.resolve(file_name)?;
        self.ensure_dir().await?;
        write_json_atomic(&path, value).await?;
        debug!(file = file_name, "wrote file");
        Ok(())
    }

    /// Delete a file. Returns `false` if it was already gone.
    pub async fn delete_file(&self, file_name: &str) -> Result<bool> {
        let path = self.resolve(file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `value` as pretty JSON to a sibling temp file, then rename it over
/// `path`.
pub(crate) async fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl PersistenceGateway for FileStore {
    async fn read_collection(&self, name: &str) -> Result<Value> {
        let value = self.read_file(&format!("{name}.json")).await?;
        Ok(value.unwrap_or_else(|| empty_for(name)))
    }

    async fn write_collection(&self, name: &str, value: &Value) -> Result<()> {
        self.write_file(&format!("{name}.json"), value).await
    }

    async fn delete_collection(&self, name: &str) -> Result<bool> {
        self.delete_file(&format!("{name}.json")).await
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let files = self.list_files().await?;
        Ok(files
            .into_iter()
            .filter_map(|f| f.strip_suffix(".json").map(String::from))
            .collect())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::errors::StorageError;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("storage"));
        (dir, store)
    }

    #[tokio::test]
    async fn missing_collection_reads_default() {
        let (_dir, store) = store();
        assert_eq!(store.read(Collection::Tasks).await.unwrap(), json!([]));
        assert_eq!(store.read(Collection::Settings).await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn write_then_read() {
        let (_dir, store) = store();
        let tasks = json!([{"id": "task-1", "title": "Write spec"}]);
        store.write(Collection::Tasks, &tasks).await.unwrap();
        assert_eq!(store.read(Collection::Tasks).await.unwrap(), tasks);

        let raw = std::fs::read_to_string(store.dir().join("tasks.json")).unwrap();
        assert!(raw.contains("\n  "), "file should be pretty-printed");
        assert!(!store.dir().join("tasks.json.tmp").exists());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, store) = store();
        store.write_collection("settings", &json!({"theme": "dark"})).await.unwrap();
        assert!(store.delete_collection("settings").await.unwrap());
        assert!(!store.delete_collection("settings").await.unwrap());
    }

    #[tokio::test]
    async fn lists_only_json_collections() {
        let (_dir, store) = store();
        store.write_collection("tasks", &json!([])).await.unwrap();
        store.write_collection("projects", &json!([])).await.unwrap();
        std::fs::write(store.dir().join("notes.txt"), "x").unwrap();

        assert_eq!(store.list_collections().await.unwrap(), vec!["projects", "tasks"]);
        assert_eq!(
            store.list_files().await.unwrap(),
            vec!["notes.txt", "projects.json", "tasks.json"]
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_json_error() {
        let (_dir, store) = store();
        store.ensure_dir().await.unwrap();
        std::fs::write(store.dir().join("tasks.json"), "{not json").unwrap();
        assert_matches!(store.read(Collection::Tasks).await, Err(StorageError::Json(_)));
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let (_dir, store) = store();
        assert_matches!(
            store.read_file("../secret.json").await,
            Err(StorageError::InvalidName(_))
        );
        assert_matches!(
            store.write_file("a/b.json", &json!({})).await,
            Err(StorageError::InvalidName(_))
        );
    }
}
