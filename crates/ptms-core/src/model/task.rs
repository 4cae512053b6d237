//! Task records.
//!
//! A [`Task`] is owned by the task store; everything else (board, metrics,
//! event payloads) works on clones.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{NoteId, ProjectId, TaskId};
use crate::time_tracking::TimeTracking;

// ─────────────────────────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────────────────────────

lossy_string_enum! {
    /// Board column a task sits in. Any status may move to any other.
    pub enum TaskStatus (fallback = Todo) {
        /// Not started.
        Todo => "todo",
        /// Being worked on; the only status whose timer may run.
        InProgress => "in-progress",
        /// Waiting for review.
        Review => "review",
        /// Finished.
        Done => "done",
    }
}

lossy_string_enum! {
    /// Task priority level.
    pub enum TaskPriority (fallback = Medium) {
        /// Elevated priority.
        High => "high",
        /// Default priority.
        Medium => "medium",
        /// Low priority.
        Low => "low",
    }
}

impl TaskPriority {
    /// Sort rank; lower sorts first on the board.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// A note appended to a task. Notes are never edited or reordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNote {
    /// Unique ID (prefixed: `note-{uuid}`).
    pub id: NoteId,
    /// Note body.
    pub text: String,
    /// When the note was added.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A task on a project board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique ID (prefixed: `task-{uuid}`), immutable.
    pub id: TaskId,
    /// Owning project, immutable.
    pub project_id: ProjectId,
    /// Short description; never blank.
    pub title: String,
    /// Detailed description.
    #[serde(default)]
    pub description: Option<String>,
    /// Person responsible.
    #[serde(default)]
    pub assignee: Option<String>,
    /// Due date as entered (`YYYY-MM-DD` or RFC 3339).
    #[serde(default)]
    pub due_date: Option<String>,
    /// Priority level.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub priority: TaskPriority,
    /// Current board column.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: TaskStatus,
    /// First time the task entered `in-progress`.
    #[serde(default, with = "crate::timestamp::option")]
    pub started_at: Option<DateTime<Utc>>,
    /// Set while the task is `done`.
    #[serde(default, with = "crate::timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Append-only notes, oldest first.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub notes: Vec<TaskNote>,
    /// Embedded timer state. Older records omit it or store `null`.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub time_tracking: TimeTracking,
    /// Creation timestamp.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    #[serde(with = "crate::timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether this task's timer is running.
    #[must_use]
    pub fn is_timer_active(&self) -> bool {
        self.time_tracking.is_active
    }

    /// Due date as a sortable instant, if present and parseable.
    ///
    /// Accepts plain dates (midnight UTC), `datetime-local` values and
    /// RFC 3339 timestamps.
    #[must_use]
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        let raw = self.due_date.as_deref()?.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
            return Some(dt);
        }
        crate::timestamp::parse_iso(raw)
            .ok()
            .map(|dt| dt.naive_utc())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
