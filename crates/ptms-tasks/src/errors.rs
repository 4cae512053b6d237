//! Task error types.
//!
//! Every failure is reported to the immediate caller; nothing here retries.
//! [`TaskError::kind`] collapses the variants into the categories a UI
//! renders differently.

use std::fmt;

use ptms_core::TimerError;
use ptms_storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Errors from task and project operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity type ("Task" or "Project").
        entity: &'static str,
        /// The ID that was looked up.
        id: String,
    },

    /// Bad input (blank title, blank note, malformed import record).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation not allowed in the task's current status.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Timer double-start or double-stop.
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// The gateway rejected a read or write. In-memory state is unchanged.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    /// A stored collection could not be decoded or encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Distinguishable error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Bad input.
    Validation,
    /// Unknown task or project id.
    NotFound,
    /// Timer toggle on a task that is not in progress.
    InvalidState,
    /// Timer already running.
    AlreadyActive,
    /// Timer not running.
    NotActive,
    /// Storage read/write failure.
    Persistence,
}

impl ErrorKind {
    /// Stable identifier for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "notFound",
            Self::InvalidState => "invalidState",
            Self::AlreadyActive => "alreadyActive",
            Self::NotActive => "notActive",
            Self::Persistence => "persistence",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TaskError {
    /// Create a not-found error for a task.
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Task",
            id: id.into(),
        }
    }

    /// Create a not-found error for a project.
    pub fn project_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Project",
            id: id.into(),
        }
    }

    /// Error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Timer(TimerError::AlreadyActive) => ErrorKind::AlreadyActive,
            Self::Timer(TimerError::NotActive) => ErrorKind::NotActive,
            Self::Persistence(_) | Self::Serialization(_) => ErrorKind::Persistence,
        }
    }
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, TaskError>;
