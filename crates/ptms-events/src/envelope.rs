//! Transport wrapper for published events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::TmsEvent;

/// An event as delivered to subscribers.
///
/// ```json
/// { "seq": 7, "timestamp": "2024-05-01T12:00:00.000Z", "event": { "type": "task:updated", "data": {...} } }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    /// Publish order on this bus, starting at 1.
    pub seq: u64,
    /// When the event was published.
    #[serde(with = "ptms_core::timestamp")]
    pub timestamp: DateTime<Utc>,
    /// The event itself.
    pub event: TmsEvent,
}

impl EventEnvelope {
    /// Wire name of the wrapped event.
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}
