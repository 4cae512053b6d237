//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ptms_core::ManualClock;
use ptms_events::{EventBus, EventEnvelope, TmsEvent};
use ptms_storage::{Collection, LocalStore, PersistenceGateway, StorageError};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::store::TaskStore;

/// Fixed test epoch: 2024-05-01T12:00:00Z.
pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// In-memory gateway whose writes can be switched to fail.
pub(crate) struct FlakyGateway {
    inner: LocalStore,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyGateway {
    pub(crate) fn new() -> Self {
        Self {
            inner: LocalStore::in_memory(),
            failing: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful writes so far.
    pub(crate) fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceGateway for FlakyGateway {
    async fn read_collection(&self, name: &str) -> ptms_storage::Result<Value> {
        self.inner.read_collection(name).await
    }

    async fn write_collection(&self, name: &str, value: &Value) -> ptms_storage::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("simulated outage".into()));
        }
        self.inner.write_collection(name, value).await?;
        let _ = self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> ptms_storage::Result<bool> {
        self.inner.delete_collection(name).await
    }

    async fn list_collections(&self) -> ptms_storage::Result<Vec<String>> {
        self.inner.list_collections().await
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}

pub(crate) struct Harness {
    pub store: Arc<TaskStore>,
    pub clock: Arc<ManualClock>,
    pub bus: Arc<EventBus>,
    pub gateway: Arc<FlakyGateway>,
}

/// Empty task store at [`t0`].
pub(crate) async fn harness() -> Harness {
    harness_with(Value::Array(Vec::new())).await
}

/// Task store opened over a pre-seeded `tasks` collection.
pub(crate) async fn harness_with(tasks: Value) -> Harness {
    let gateway = Arc::new(FlakyGateway::new());
    gateway.write(Collection::Tasks, &tasks).await.unwrap();
    let clock = Arc::new(ManualClock::new(t0()));
    let bus = Arc::new(EventBus::new());
    let store = Arc::new(
        TaskStore::open(gateway.clone(), bus.clone(), clock.clone())
            .await
            .unwrap(),
    );
    Harness {
        store,
        clock,
        bus,
        gateway,
    }
}

/// Everything currently buffered on a subscription.
pub(crate) fn drain(rx: &mut broadcast::Receiver<EventEnvelope>) -> Vec<TmsEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope.event);
    }
    events
}
