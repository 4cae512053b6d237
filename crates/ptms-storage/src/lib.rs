//! # ptms-storage
//!
//! Persistence gateway for Project-TMS.
//!
//! Collections (`projects`, `tasks`, `settings`, `last_sync`) are whole JSON
//! documents read and written in one piece. Every backend implements
//! [`PersistenceGateway`]:
//!
//! - [`FileStore`]: one pretty-printed `<name>.json` file per collection
//! - [`LocalStore`]: `tms_<name>` key/value map, optionally mirrored to disk
//! - [`RemoteStore`]: HTTP client of the file server, with a bounded timeout
//! - [`FallbackStore`]: remote first, local cache when the remote is down
//!
//! [`backup`] builds and applies export snapshots over any gateway.

#![deny(unsafe_code)]

pub mod backup;
pub mod collection;
pub mod errors;
pub mod fallback;
pub mod file;
pub mod gateway;
pub mod local;
pub mod remote;

pub use backup::{ImportStats, Snapshot, export_snapshot, import_snapshot};
pub use collection::Collection;
pub use errors::{Result, StorageError};
pub use fallback::FallbackStore;
pub use file::FileStore;
pub use gateway::PersistenceGateway;
pub use local::LocalStore;
pub use remote::RemoteStore;
