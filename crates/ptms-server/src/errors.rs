//! Server error types and their HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ptms_storage::StorageError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors from request handlers and server startup.
#[derive(Debug, Error)]
pub enum ServerError {
    /// File name would escape the storage directory.
    #[error("Access denied")]
    AccessDenied,

    /// Malformed request body.
    #[error("{0}")]
    BadRequest(String),

    /// Filesystem or JSON failure while serving a request.
    #[error("{context}: {source}")]
    Storage {
        /// What the handler was doing.
        context: &'static str,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },

    /// Could not bind the listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

impl ServerError {
    /// Adapter for `map_err`: bad names become 403, bad snapshots 400,
    /// anything else a 500 tagged with `context`.
    pub fn storage(context: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| match source {
            StorageError::InvalidName(_) => Self::AccessDenied,
            StorageError::InvalidSnapshot(msg) => Self::BadRequest(msg),
            source => Self::Storage { context, source },
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage { .. } | Self::Bind { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
