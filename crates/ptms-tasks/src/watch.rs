//! Background observers: board refresher and active-timer ticker.
//!
//! Both run on their own tokio task, publish through a `watch` channel and
//! stop when their [`CancellationToken`] fires or every receiver is dropped.
//! Neither ever mutates the store.

use std::sync::Arc;
use std::time::Duration;

use ptms_core::{Clock, ProjectId};
use ptms_events::EventBus;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::board::Board;
use crate::store::{ActiveTimer, TaskStore};

/// Keep a project's [`Board`] current.
///
/// The subscription is taken before the initial projection, so no mutation
/// can slip between the two. Every board-relevant event triggers a full
/// recompute; a lagged subscription also recomputes, since the latest store
/// state is all that matters.
pub async fn spawn_board_refresher(
    store: Arc<TaskStore>,
    bus: &EventBus,
    project_id: ProjectId,
    token: CancellationToken,
) -> watch::Receiver<Board> {
    let mut events = bus.subscribe();
    let initial = Board::project(store.list_for_project(&project_id).await);
    let (tx, rx) = watch::channel(initial);

    let _ = tokio::spawn(async move {
        loop {
            let recompute = tokio::select! {
                () = token.cancelled() => break,
                recv = events.recv() => match recv {
                    Ok(envelope) => envelope.event.affects_board(&project_id),
                    Err(RecvError::Lagged(missed)) => {
                        warn!(project_id = %project_id, missed, "board refresher lagged, recomputing");
                        true
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            if !recompute {
                continue;
            }
            let board = Board::project(store.list_for_project(&project_id).await);
            debug!(project_id = %project_id, total = board.counts.total, "board recomputed");
            if tx.send(board).is_err() {
                break;
            }
        }
        debug!(project_id = %project_id, "board refresher stopped");
    });

    rx
}

/// Publish an [`ActiveTimer`] snapshot every `period`.
///
/// A pure read: committed `totalTime` only changes when a timer is stopped.
pub fn spawn_timer_ticker(
    store: Arc<TaskStore>,
    clock: Arc<dyn Clock>,
    period: Duration,
    token: CancellationToken,
) -> watch::Receiver<Option<ActiveTimer>> {
    let (tx, rx) = watch::channel(None);
    let period = period.max(Duration::from_millis(1));

    let _ = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = interval.tick() => {
                    let snapshot = store.active_timer(clock.now()).await;
                    if tx.send(snapshot).is_err() {
                        break;
                    }
                }
            }
        }
        debug!("timer ticker stopped");
    });

    rx
}
