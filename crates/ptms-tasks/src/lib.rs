//! # ptms-tasks
//!
//! Task lifecycle, time tracking and board projection for Project-TMS.
//!
//! - [`TaskStore`]: single-writer owner of every task; enforces status side
//!   effects and the one-active-timer-at-a-time rule
//! - [`ProjectStore`]: project CRUD with cascading task deletion
//! - [`Board`]: pure four-column projection of a project's tasks
//! - [`metrics`]: completion and time-tracking summaries
//! - [`watch`]: board refresher and active-timer ticker
//! - [`Workspace`]: opens both stores over one gateway; export/import

#![deny(unsafe_code)]

pub mod board;
pub mod errors;
pub mod metrics;
pub mod projects;
pub mod store;
pub mod types;
pub mod watch;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use board::{Board, BoardCounts};
pub use errors::{ErrorKind, TaskError};
pub use projects::ProjectStore;
pub use store::{ActiveTimer, TaskStore};
pub use types::{ProjectCreateParams, ProjectPatch, TaskCreateParams, TaskPatch};
pub use workspace::Workspace;
