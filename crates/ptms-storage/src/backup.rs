//! Whole-store export and import.
//!
//! An export is one JSON object: every collection keyed by name, plus
//! `exportDate` and `version`. An import requires `projects` and `tasks`
//! arrays, replaces them (and `settings` when present) and stamps
//! `last_sync`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::collection::Collection;
use crate::errors::{Result, StorageError};
use crate::gateway::PersistenceGateway;

/// Format version written into exports.
pub const EXPORT_VERSION: &str = "2.0";

/// A validated import payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Project records, unparsed.
    pub projects: Vec<Value>,
    /// Task records, unparsed.
    pub tasks: Vec<Value>,
    /// Settings object, if the snapshot carries one.
    pub settings: Option<Value>,
}

/// Counts reported after an import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    /// Projects written.
    pub project_count: usize,
    /// Tasks written.
    pub task_count: usize,
}

impl Snapshot {
    /// Validate an import body.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(StorageError::InvalidSnapshot("expected a JSON object".into()));
        };
        let projects = take_array(&mut map, "projects")?;
        let tasks = take_array(&mut map, "tasks")?;
        let settings = map.remove("settings").filter(|v| !v.is_null());
        Ok(Self {
            projects,
            tasks,
            settings,
        })
    }

    /// Counts for this snapshot.
    pub fn stats(&self) -> ImportStats {
        ImportStats {
            project_count: self.projects.len(),
            task_count: self.tasks.len(),
        }
    }
}

fn take_array(map: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match map.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(StorageError::InvalidSnapshot(format!(
            "invalid or missing {key} data structure"
        ))),
    }
}

/// Build an export of every collection in `gateway`.
///
/// Collections that fail to read are skipped with a warning. `projects`,
/// `tasks` and `settings` are always present.
pub async fn export_snapshot(
    gateway: &dyn PersistenceGateway,
    now: DateTime<Utc>,
) -> Result<Value> {
    let mut out = Map::new();
    for name in gateway.list_collections().await? {
        match gateway.read_collection(&name).await {
            Ok(value) => {
                let _ = out.insert(name, value);
            }
            Err(e) => warn!(collection = %name, error = %e, "skipping unreadable collection in export"),
        }
    }
    for collection in [Collection::Projects, Collection::Tasks, Collection::Settings] {
        let _ = out
            .entry(collection.name())
            .or_insert_with(|| collection.empty());
    }
    let _ = out.insert("exportDate".into(), Value::String(ptms_core::timestamp::to_iso(&now)));
    let _ = out.insert("version".into(), Value::String(EXPORT_VERSION.into()));
    Ok(Value::Object(out))
}

/// Replace collections from a snapshot and record the sync time.
pub async fn import_snapshot(
    gateway: &dyn PersistenceGateway,
    snapshot: Snapshot,
    now: DateTime<Utc>,
) -> Result<ImportStats> {
    let stats = snapshot.stats();
    gateway
        .write(Collection::Projects, &Value::Array(snapshot.projects))
        .await?;
    gateway
        .write(Collection::Tasks, &Value::Array(snapshot.tasks))
        .await?;
    if let Some(settings) = snapshot.settings {
        gateway.write(Collection::Settings, &settings).await?;
    }
    gateway
        .write(
            Collection::LastSync,
            &json!({ "lastSync": ptms_core::timestamp::to_iso(&now) }),
        )
        .await?;
    info!(
        projects = stats.project_count,
        tasks = stats.task_count,
        backend = gateway.backend(),
        "imported snapshot"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileStore;
    use crate::local::LocalStore;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn snapshot_requires_arrays() {
        assert_matches!(
            Snapshot::from_value(json!({"projects": []})),
            Err(StorageError::InvalidSnapshot(msg)) if msg.contains("tasks")
        );
        assert_matches!(
            Snapshot::from_value(json!({"projects": {}, "tasks": []})),
            Err(StorageError::InvalidSnapshot(msg)) if msg.contains("projects")
        );
        assert_matches!(
            Snapshot::from_value(json!([1, 2])),
            Err(StorageError::InvalidSnapshot(_))
        );
    }

    #[test]
    fn snapshot_null_settings_is_absent() {
        let snap =
            Snapshot::from_value(json!({"projects": [], "tasks": [{}], "settings": null})).unwrap();
        assert!(snap.settings.is_none());
        assert_eq!(
            snap.stats(),
            ImportStats {
                project_count: 0,
                task_count: 1
            }
        );
    }

    #[tokio::test]
    async fn import_writes_collections_and_last_sync() {
        let store = LocalStore::in_memory();
        let snap = Snapshot::from_value(json!({
            "projects": [{"id": "proj-1"}],
            "tasks": [{"id": "task-1"}, {"id": "task-2"}],
            "settings": {"theme": "dark"}
        }))
        .unwrap();

        let stats = import_snapshot(&store, snap, now()).await.unwrap();
        assert_eq!(stats.project_count, 1);
        assert_eq!(stats.task_count, 2);
        assert_eq!(
            store.read(Collection::LastSync).await.unwrap(),
            json!({"lastSync": "2024-05-01T12:00:00.000Z"})
        );
        assert_eq!(
            store.read(Collection::Settings).await.unwrap(),
            json!({"theme": "dark"})
        );
    }

    #[tokio::test]
    async fn export_includes_everything_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.write(Collection::Tasks, &json!([{"id": "task-1"}])).await.unwrap();
        store.write_collection("custom", &json!({"a": 1})).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{oops").unwrap();

        let export = export_snapshot(&store, now()).await.unwrap();
        assert_eq!(export["tasks"], json!([{"id": "task-1"}]));
        assert_eq!(export["projects"], json!([]));
        assert_eq!(export["custom"], json!({"a": 1}));
        assert!(export.get("broken").is_none());
        assert_eq!(export["version"], "2.0");
        assert_eq!(export["exportDate"], "2024-05-01T12:00:00.000Z");
    }

    #[tokio::test]
    async fn export_then_import_elsewhere() {
        let source = LocalStore::in_memory();
        source
            .write(Collection::Projects, &json!([{"id": "proj-1"}]))
            .await
            .unwrap();
        let export = export_snapshot(&source, now()).await.unwrap();

        let target = LocalStore::in_memory();
        let stats = import_snapshot(&target, Snapshot::from_value(export).unwrap(), now())
            .await
            .unwrap();
        assert_eq!(stats.project_count, 1);
        assert_eq!(
            target.read(Collection::Projects).await.unwrap(),
            json!([{"id": "proj-1"}])
        );
    }
}
