//! # ptms-core
//!
//! Foundation types for Project-TMS.
//!
//! This crate provides the shared vocabulary that all other crates depend on:
//!
//! - **Branded IDs**: `TaskId`, `ProjectId`, `NoteId` as prefixed newtypes
//! - **Clock**: [`Clock`] trait with a system and a manual (test) source
//! - **Time tracking**: the pure start/stop/elapsed engine for a task timer
//! - **Timestamps**: ISO-8601 millisecond codec used on the wire
//! - **Model**: `Task` and `Project` records with lenient enum reads
//! - **Logging**: `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod clock;
pub mod duration;
pub mod ids;
pub mod logging;
pub mod model;
pub mod time_tracking;
pub mod timestamp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use duration::format_duration;
pub use ids::{NoteId, ProjectId, TaskId};
pub use model::{Project, ProjectStatus, Task, TaskNote, TaskPriority, TaskStatus};
pub use time_tracking::{TimeTracking, TimerError};
