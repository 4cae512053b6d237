//! Storage error types.

use thiserror::Error;

/// Errors raised by persistence backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Local filesystem failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored document or request body was not valid JSON.
    #[error("invalid JSON in storage: {0}")]
    Json(#[from] serde_json::Error),
    /// The backend could not be reached (connection refused, timeout).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The remote backend answered with a non-success status.
    #[error("remote storage returned {status}: {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Error text from the response body.
        message: String,
    },
    /// A collection or file name that could escape the storage directory.
    #[error("access denied: invalid collection name '{0}'")]
    InvalidName(String),
    /// An import snapshot without the required collections.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl StorageError {
    /// Whether this failure means the backend is unreachable, so a fallback
    /// store may serve the request instead.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
