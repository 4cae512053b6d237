//! Project records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ProjectId;

lossy_string_enum! {
    /// Project lifecycle state.
    pub enum ProjectStatus (fallback = Active) {
        /// Work ongoing.
        Active => "active",
        /// Paused.
        OnHold => "on-hold",
        /// Finished.
        Completed => "completed",
        /// Hidden from day-to-day views.
        Archived => "archived",
    }
}

/// A project groups tasks onto one board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique ID (prefixed: `proj-{uuid}`).
    pub id: ProjectId,
    /// Display name; never blank.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Planned start, as entered.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Planned end, as entered.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Lifecycle state.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: ProjectStatus,
    /// Creation timestamp.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    #[serde(with = "crate::timestamp")]
    pub updated_at: DateTime<Utc>,
}
