//! Broadcast-based event bus.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::envelope::EventEnvelope;
use crate::event::TmsEvent;

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 256;

/// Publish/subscribe fan-out for [`TmsEvent`]s.
///
/// Non-blocking: `publish` never awaits. A subscriber that falls more than
/// the channel capacity behind receives `RecvError::Lagged` and should
/// resynchronise from the store rather than replaying events.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
    seq: AtomicU64,
}

impl EventBus {
    /// Create a bus with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with a custom channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            seq: AtomicU64::new(0),
        }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, event: TmsEvent) -> usize {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let event_type = event.event_type();
        let envelope = EventEnvelope {
            seq,
            timestamp: Utc::now(),
            event,
        };
        let recipients = self.tx.send(envelope).unwrap_or(0);
        debug!(event_type, seq, recipients, "published event");
        recipients
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Number of events published so far.
    pub fn published_count(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
