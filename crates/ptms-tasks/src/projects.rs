//! Project store.
//!
//! Same commit discipline as [`TaskStore`]: mutate a clone, write, swap,
//! then publish. Deleting a project cascades to its tasks.

use std::sync::Arc;

use ptms_core::model::non_blank;
use ptms_core::{Clock, Project, ProjectId};
use ptms_events::{EventBus, TmsEvent};
use ptms_storage::{Collection, PersistenceGateway};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::errors::{Result, TaskError};
use crate::store::TaskStore;
use crate::types::{ProjectCreateParams, ProjectPatch};

/// Single-writer owner of the project collection.
pub struct ProjectStore {
    projects: Mutex<Vec<Project>>,
    tasks: Arc<TaskStore>,
    gateway: Arc<dyn PersistenceGateway>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
}

fn decode_projects(value: Value) -> Result<Vec<Project>> {
    let Value::Array(items) = value else {
        return Err(TaskError::Serialization(
            "projects collection is not an array".into(),
        ));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| TaskError::Serialization(format!("project record {i}: {e}")))
        })
        .collect()
}

fn required_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TaskError::Validation("Project name is required".into()));
    }
    Ok(name.to_string())
}

impl ProjectStore {
    /// Open the store over the same gateway as `tasks`.
    pub async fn open(
        tasks: Arc<TaskStore>,
        gateway: Arc<dyn PersistenceGateway>,
        bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let store = Self {
            projects: Mutex::new(Vec::new()),
            tasks,
            gateway,
            bus,
            clock,
        };
        let _ = store.reload().await?;
        Ok(store)
    }

    /// Re-read the `projects` collection.
    pub async fn reload(&self) -> Result<usize> {
        let mut guard = self.projects.lock().await;
        let loaded = decode_projects(self.gateway.read(Collection::Projects).await?)?;
        let count = loaded.len();
        *guard = loaded;
        debug!(count, "loaded projects");
        Ok(count)
    }

    async fn commit(
        &self,
        guard: &mut MutexGuard<'_, Vec<Project>>,
        next: Vec<Project>,
    ) -> Result<()> {
        let value =
            serde_json::to_value(&next).map_err(|e| TaskError::Serialization(e.to_string()))?;
        if let Err(e) = self.gateway.write(Collection::Projects, &value).await {
            warn!(error = %e, "project write failed, change discarded");
            return Err(e.into());
        }
        **guard = next;
        Ok(())
    }

    /// The task store this project store cascades into.
    pub fn tasks(&self) -> &Arc<TaskStore> {
        &self.tasks
    }

    /// Look up a project.
    pub async fn get(&self, id: &ProjectId) -> Result<Project> {
        self.projects
            .lock()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| TaskError::project_not_found(id.as_str()))
    }

    /// All projects, in insertion order.
    pub async fn list(&self) -> Vec<Project> {
        self.projects.lock().await.clone()
    }

    /// Create a project.
    pub async fn create(&self, params: ProjectCreateParams) -> Result<Project> {
        let name = required_name(&params.name)?;
        let now = self.clock.now();
        let project = Project {
            id: ProjectId::new(),
            name,
            description: non_blank(params.description),
            start_date: non_blank(params.start_date),
            end_date: non_blank(params.end_date),
            status: params.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let mut guard = self.projects.lock().await;
        let mut next = guard.clone();
        next.push(project.clone());
        self.commit(&mut guard, next).await?;

        info!(project_id = %project.id, name = %project.name, "project created");
        let _ = self.bus.publish(TmsEvent::ProjectCreated(project.clone()));
        Ok(project)
    }

    /// Merge field changes into a project.
    pub async fn update(&self, id: &ProjectId, patch: ProjectPatch) -> Result<Project> {
        let name = patch.name.as_deref().map(required_name).transpose()?;

        let mut guard = self.projects.lock().await;
        let idx = guard
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| TaskError::project_not_found(id.as_str()))?;
        let mut next = guard.clone();
        let project = &mut next[idx];
        if let Some(name) = name {
            project.name = name;
        }
        if let Some(description) = patch.description {
            project.description = non_blank(Some(description));
        }
        if let Some(start_date) = patch.start_date {
            project.start_date = non_blank(Some(start_date));
        }
        if let Some(end_date) = patch.end_date {
            project.end_date = non_blank(Some(end_date));
        }
        if let Some(status) = patch.status {
            project.status = status;
        }
        project.updated_at = self.clock.now();
        let updated = project.clone();

        self.commit(&mut guard, next).await?;
        debug!(project_id = %id, "project updated");
        let _ = self.bus.publish(TmsEvent::ProjectUpdated(updated.clone()));
        Ok(updated)
    }

    /// Delete a project and every task in it.
    ///
    /// The project record is removed first, then its tasks; if the task
    /// write fails the project is already gone and the orphaned tasks stay
    /// until the next delete attempt. Returns `false` for an unknown id.
    pub async fn delete(&self, id: &ProjectId) -> Result<bool> {
        let mut guard = self.projects.lock().await;
        let Some(idx) = guard.iter().position(|p| &p.id == id) else {
            return Ok(false);
        };
        let mut next = guard.clone();
        let _ = next.remove(idx);
        self.commit(&mut guard, next).await?;

        let removed_tasks = self.tasks.delete_all_for_project(id).await?;
        info!(project_id = %id, removed_tasks, "project deleted");
        let _ = self.bus.publish(TmsEvent::ProjectDeleted {
            project_id: id.clone(),
        });
        Ok(true)
    }
}
