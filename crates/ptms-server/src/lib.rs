//! # ptms-server
//!
//! Axum JSON file server: the HTTP side of the remote storage mode.
//!
//! - `/api/files`: list, read, write and delete collection files
//! - `/api/export`, `/api/import`: whole-store backup
//! - `/health`: liveness and uptime
//! - graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod files;
pub mod health;
pub mod server;

pub use config::ServerConfig;
pub use errors::ServerError;
pub use server::{AppState, FileServer, ServerHandle};
