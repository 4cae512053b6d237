//! The [`TmsEvent`] enum: every mutation announced by the stores.
//!
//! Each variant serializes as `{"type": "<wire name>", "data": {...}}`. The
//! wire names are the colon-separated strings UI observers already listen
//! for, so they must not change.

use chrono::{DateTime, Utc};
use ptms_core::{Project, ProjectId, Task, TaskId, TaskNote};
use serde::{Deserialize, Serialize};

/// A committed mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TmsEvent {
    // ── Task ─────────────────────────────────────────────────────────
    /// A task was created.
    #[serde(rename = "task:created")]
    TaskCreated(Task),
    /// A task changed. Published after every task mutation.
    #[serde(rename = "task:updated")]
    TaskUpdated(Task),
    /// A single task was removed.
    #[serde(rename = "task:deleted", rename_all = "camelCase")]
    TaskDeleted {
        /// Removed task.
        task_id: TaskId,
        /// Project it belonged to.
        project_id: ProjectId,
    },
    /// All tasks of a project were removed at once.
    #[serde(rename = "tasks:batchDeleted", rename_all = "camelCase")]
    TasksBatchDeleted {
        /// Owning project.
        project_id: ProjectId,
        /// Removed tasks, in store order.
        task_ids: Vec<TaskId>,
    },
    /// A note was appended to a task.
    #[serde(rename = "task:noteAdded", rename_all = "camelCase")]
    TaskNoteAdded {
        /// Annotated task.
        task_id: TaskId,
        /// The new note.
        note: TaskNote,
    },

    // ── Time tracking ────────────────────────────────────────────────
    /// A task's timer started.
    #[serde(rename = "timeTracking:started", rename_all = "camelCase")]
    TimerStarted {
        /// Task whose timer is now running.
        task_id: TaskId,
        /// Owning project.
        project_id: ProjectId,
        /// Session start.
        #[serde(with = "ptms_core::timestamp")]
        started_at: DateTime<Utc>,
        /// Committed time before this session, in milliseconds.
        total_time: u64,
    },
    /// A task's timer stopped and its session was committed.
    #[serde(rename = "timeTracking:stopped", rename_all = "camelCase")]
    TimerStopped {
        /// Task whose timer stopped.
        task_id: TaskId,
        /// Owning project.
        project_id: ProjectId,
        /// Length of the session just committed, in milliseconds.
        session_time: u64,
        /// Committed time after this session, in milliseconds.
        total_time: u64,
    },

    // ── Project ──────────────────────────────────────────────────────
    /// A project was created.
    #[serde(rename = "project:created")]
    ProjectCreated(Project),
    /// A project changed.
    #[serde(rename = "project:updated")]
    ProjectUpdated(Project),
    /// A project and all its tasks were removed.
    #[serde(rename = "project:deleted", rename_all = "camelCase")]
    ProjectDeleted {
        /// Removed project.
        project_id: ProjectId,
    },

    // ── Data ─────────────────────────────────────────────────────────
    /// Collections were replaced by an import; observers should reload.
    #[serde(rename = "data:imported", rename_all = "camelCase")]
    DataImported {
        /// Projects in the imported snapshot.
        project_count: usize,
        /// Tasks in the imported snapshot.
        task_count: usize,
    },
}

impl TmsEvent {
    /// Wire name of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TaskCreated(_) => "task:created",
            Self::TaskUpdated(_) => "task:updated",
            Self::TaskDeleted { .. } => "task:deleted",
            Self::TasksBatchDeleted { .. } => "tasks:batchDeleted",
            Self::TaskNoteAdded { .. } => "task:noteAdded",
            Self::TimerStarted { .. } => "timeTracking:started",
            Self::TimerStopped { .. } => "timeTracking:stopped",
            Self::ProjectCreated(_) => "project:created",
            Self::ProjectUpdated(_) => "project:updated",
            Self::ProjectDeleted { .. } => "project:deleted",
            Self::DataImported { .. } => "data:imported",
        }
    }

    /// Whether a board projection must be recomputed after this event.
    pub fn is_board_relevant(&self) -> bool {
        matches!(
            self,
            Self::TaskCreated(_)
                | Self::TaskUpdated(_)
                | Self::TaskDeleted { .. }
                | Self::TasksBatchDeleted { .. }
                | Self::TimerStarted { .. }
                | Self::TimerStopped { .. }
                | Self::ProjectDeleted { .. }
                | Self::DataImported { .. }
        )
    }

    /// Project this event concerns, if it is scoped to one.
    ///
    /// `None` means the event may touch every project.
    pub fn project_id(&self) -> Option<&ProjectId> {
        match self {
            Self::TaskCreated(task) | Self::TaskUpdated(task) => Some(&task.project_id),
            Self::TaskDeleted { project_id, .. }
            | Self::TasksBatchDeleted { project_id, .. }
            | Self::TimerStarted { project_id, .. }
            | Self::TimerStopped { project_id, .. }
            | Self::ProjectDeleted { project_id } => Some(project_id),
            Self::ProjectCreated(project) | Self::ProjectUpdated(project) => Some(&project.id),
            Self::TaskNoteAdded { .. } | Self::DataImported { .. } => None,
        }
    }

    /// Whether this event should trigger a recompute of `project_id`'s board.
    pub fn affects_board(&self, project_id: &ProjectId) -> bool {
        self.is_board_relevant() && self.project_id().is_none_or(|p| p == project_id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
