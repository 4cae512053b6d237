//! Branded ID newtypes for type safety.
//!
//! Every entity in Project-TMS has a distinct ID type implemented as a
//! newtype wrapper around `String`. This prevents accidentally passing a
//! project ID where a task ID is expected.
//!
//! Fresh IDs are `{prefix}-{uuid v7}`, so they are unique within the process
//! and sort by creation time. IDs read back from storage are kept verbatim,
//! whatever their shape (older records used millisecond timestamps).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a new prefixed UUID v7 string (time-ordered).
fn new_prefixed(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::now_v7())
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix used for freshly generated IDs.
            pub const PREFIX: &'static str = $prefix;

            /// Create a new random ID (prefixed UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(new_prefixed($prefix))
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for a task.
    TaskId, "task"
}

branded_id! {
    /// Unique identifier for a project.
    ProjectId, "proj"
}

branded_id! {
    /// Unique identifier for a note attached to a task.
    NoteId, "note"
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
