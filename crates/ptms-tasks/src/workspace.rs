//! Both stores over one gateway, plus whole-store backup.

use std::sync::Arc;

use ptms_core::{Clock, Project, Task};
use ptms_events::{EventBus, TmsEvent};
use ptms_storage::{ImportStats, PersistenceGateway, Snapshot, export_snapshot, import_snapshot};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::errors::{Result, TaskError};
use crate::projects::ProjectStore;
use crate::store::TaskStore;

/// An opened data set: task store, project store and the bus they publish
/// on.
pub struct Workspace {
    gateway: Arc<dyn PersistenceGateway>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    tasks: Arc<TaskStore>,
    projects: Arc<ProjectStore>,
}

fn check_records<T: DeserializeOwned>(kind: &str, records: &[Value]) -> Result<()> {
    for (i, record) in records.iter().enumerate() {
        if let Err(e) = T::deserialize(record) {
            return Err(TaskError::Validation(format!("{kind} record {i}: {e}")));
        }
    }
    Ok(())
}

impl Workspace {
    /// Open both stores.
    pub async fn open(
        gateway: Arc<dyn PersistenceGateway>,
        bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let tasks = Arc::new(TaskStore::open(gateway.clone(), bus.clone(), clock.clone()).await?);
        let projects = Arc::new(
            ProjectStore::open(tasks.clone(), gateway.clone(), bus.clone(), clock.clone()).await?,
        );
        info!(backend = gateway.backend(), "workspace opened");
        Ok(Self {
            gateway,
            bus,
            clock,
            tasks,
            projects,
        })
    }

    /// Task store.
    pub fn tasks(&self) -> &Arc<TaskStore> {
        &self.tasks
    }

    /// Project store.
    pub fn projects(&self) -> &Arc<ProjectStore> {
        &self.projects
    }

    /// Event bus both stores publish on.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Time source.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Export every collection.
    pub async fn export(&self) -> Result<Value> {
        Ok(export_snapshot(self.gateway.as_ref(), self.clock.now()).await?)
    }

    /// Replace projects and tasks from a snapshot.
    ///
    /// Every record must decode before anything is written. The write
    /// itself goes straight to the gateway and both stores reload
    /// afterwards; a mutation racing the import may be overwritten.
    pub async fn import(&self, snapshot: Snapshot) -> Result<ImportStats> {
        check_records::<Project>("project", &snapshot.projects)?;
        check_records::<Task>("task", &snapshot.tasks)?;

        let stats = import_snapshot(self.gateway.as_ref(), snapshot, self.clock.now()).await?;
        let _ = self.projects.reload().await?;
        let _ = self.tasks.reload().await?;

        let _ = self.bus.publish(TmsEvent::DataImported {
            project_count: stats.project_count,
            task_count: stats.task_count,
        });
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FlakyGateway, drain, t0};
    use crate::types::{ProjectCreateParams, TaskCreateParams};
    use assert_matches::assert_matches;
    use ptms_core::ManualClock;
    use serde_json::json;

    async fn workspace() -> Workspace {
        Workspace::open(
            Arc::new(FlakyGateway::new()),
            Arc::new(EventBus::new()),
            Arc::new(ManualClock::new(t0())),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn export_then_import_round_trip() {
        let source = workspace().await;
        let project = source
            .projects()
            .create(ProjectCreateParams {
                name: "Website".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let task = source
            .tasks()
            .create(TaskCreateParams::new(project.id.clone(), "Landing page"))
            .await
            .unwrap();
        let export = source.export().await.unwrap();
        assert_eq!(export["version"], "2.0");

        let target = workspace().await;
        let mut rx = target.bus().subscribe();
        let stats = target
            .import(Snapshot::from_value(export).unwrap())
            .await
            .unwrap();
        assert_eq!(stats.project_count, 1);
        assert_eq!(stats.task_count, 1);
        assert_eq!(target.projects().list().await, vec![project]);
        assert_eq!(target.tasks().list().await, vec![task]);

        let events = drain(&mut rx);
        assert_matches!(events.as_slice(), [TmsEvent::DataImported { task_count: 1, .. }]);
    }

    #[tokio::test]
    async fn import_rejects_bad_records_before_writing() {
        let ws = workspace().await;
        let existing = ws
            .tasks()
            .create(TaskCreateParams::new("proj-1", "keep me"))
            .await
            .unwrap();
        let snapshot = Snapshot::from_value(json!({
            "projects": [],
            "tasks": [{"title": "missing id"}]
        }))
        .unwrap();
        let err = ws.import(snapshot).await.unwrap_err();
        assert_matches!(&err, TaskError::Validation(msg) if msg.starts_with("task record 0"));
        assert_eq!(ws.tasks().list().await, vec![existing]);
    }
}
