//! Well-known collection names and name rules.

use serde_json::Value;

use crate::errors::{Result, StorageError};

/// The collections the application reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    /// `projects.json`: array of projects.
    Projects,
    /// `tasks.json`: array of tasks.
    Tasks,
    /// `settings.json`: UI settings object, opaque to the core.
    Settings,
    /// `last_sync.json`: `{ "lastSync": <iso> }`, written by imports.
    LastSync,
}

impl Collection {
    /// Collection name (file stem).
    pub fn name(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Tasks => "tasks",
            Self::Settings => "settings",
            Self::LastSync => "last_sync",
        }
    }

    /// File name on disk and on the file server.
    pub fn file_name(self) -> String {
        format!("{}.json", self.name())
    }

    /// Value returned when the collection does not exist yet.
    pub fn empty(self) -> Value {
        empty_for(self.name())
    }
}

/// Default for an absent collection: `[]` for project and task lists, `{}`
/// for everything else.
pub fn empty_for(name: &str) -> Value {
    if name.contains("tasks") || name.contains("projects") {
        Value::Array(Vec::new())
    } else {
        Value::Object(serde_json::Map::new())
    }
}

/// Reject names that are empty or could address a path outside the store.
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}
