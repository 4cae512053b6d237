//! `/api` handlers.

use axum::Json;
use axum::extract::{Path, State};
use ptms_storage::collection::empty_for;
use ptms_storage::{Snapshot, export_snapshot, import_snapshot};
use serde_json::{Value, json};
use tracing::info;

use crate::errors::ServerError;
use crate::server::AppState;

type ApiResult = Result<Json<Value>, ServerError>;

/// GET /api/files
pub async fn list_files(State(state): State<AppState>) -> ApiResult {
    let files = state
        .files
        .list_files()
        .await
        .map_err(ServerError::storage("Failed to list files"))?;
    Ok(Json(json!({ "files": files })))
}

/// GET /api/files/{filename}
///
/// A missing file reads as an empty collection.
pub async fn read_file(State(state): State<AppState>, Path(filename): Path<String>) -> ApiResult {
    let value = state
        .files
        .read_file(&filename)
        .await
        .map_err(ServerError::storage("Failed to read file"))?;
    Ok(Json(value.unwrap_or_else(|| empty_for(&filename))))
}

/// POST /api/files/{filename}
pub async fn write_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    state
        .files
        .write_file(&filename, &body)
        .await
        .map_err(ServerError::storage("Failed to write file"))?;
    Ok(Json(json!({
        "success": true,
        "message": format!("File {filename} saved successfully"),
    })))
}

/// DELETE /api/files/{filename}
///
/// Succeeds whether or not the file existed; the message tells which.
pub async fn delete_file(State(state): State<AppState>, Path(filename): Path<String>) -> ApiResult {
    let existed = state
        .files
        .delete_file(&filename)
        .await
        .map_err(ServerError::storage("Failed to delete file"))?;
    let message = if existed {
        format!("File {filename} deleted successfully")
    } else {
        format!("File {filename} already doesn't exist")
    };
    Ok(Json(json!({ "success": true, "message": message })))
}

/// GET /api/export
pub async fn export(State(state): State<AppState>) -> ApiResult {
    let data = export_snapshot(&state.files, state.clock.now())
        .await
        .map_err(ServerError::storage("Failed to export data"))?;
    Ok(Json(data))
}

/// POST /api/import
pub async fn import(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult {
    let snapshot = Snapshot::from_value(body).map_err(ServerError::storage("Failed to import data"))?;
    let stats = import_snapshot(&state.files, snapshot, state.clock.now())
        .await
        .map_err(ServerError::storage("Failed to import data"))?;
    info!(projects = stats.project_count, tasks = stats.task_count, "data imported");
    Ok(Json(json!({
        "success": true,
        "message": "Data imported successfully",
        "stats": stats,
    })))
}
