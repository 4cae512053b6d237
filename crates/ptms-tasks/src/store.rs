//! The task store.
//!
//! [`TaskStore`] owns every task and is the only writer of the `tasks`
//! collection. All mutations run under one async mutex:
//!
//! 1. the current collection is cloned,
//! 2. the change is applied to the clone (status side effects, timer stops),
//! 3. the whole collection is written through the gateway,
//! 4. only then is the clone swapped in and events published.
//!
//! A failed write leaves memory untouched and surfaces as
//! [`TaskError::Persistence`]. A timer toggle touches two tasks (the one
//! being started and whichever was running) and commits both in the same
//! write, so there is never a moment with two active timers.
//!
//! Status side effects:
//!
//! | change | effect |
//! |---|---|
//! | → in-progress, `startedAt` unset | `startedAt = now` |
//! | leaving in-progress with a running timer | timer stopped, session committed |
//! | → done | `completedAt = now` |
//! | done → other | `completedAt` cleared |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ptms_core::model::non_blank;
use ptms_core::{
    Clock, NoteId, ProjectId, Task, TaskId, TaskNote, TaskStatus, TimeTracking, TimerError,
};
use ptms_events::{EventBus, TmsEvent};
use ptms_storage::{Collection, PersistenceGateway};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::errors::{Result, TaskError};
use crate::types::{TaskCreateParams, TaskPatch};

/// Snapshot of the running timer, for periodic display refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimer {
    /// Task whose timer is running.
    pub task_id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Task title.
    pub title: String,
    /// Committed time before the running session, in milliseconds.
    pub total_time: u64,
    /// Length of the running session so far, in milliseconds.
    pub session_time: u64,
    /// `total_time + session_time`.
    pub elapsed: u64,
}

/// Single-writer owner of the task collection.
pub struct TaskStore {
    tasks: Mutex<Vec<Task>>,
    gateway: Arc<dyn PersistenceGateway>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Pure helpers
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn decode_tasks(value: Value) -> Result<Vec<Task>> {
    let Value::Array(items) = value else {
        return Err(TaskError::Serialization(
            "tasks collection is not an array".into(),
        ));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| TaskError::Serialization(format!("task record {i}: {e}")))
        })
        .collect()
}

fn encode_tasks(tasks: &[Task]) -> Result<Value> {
    serde_json::to_value(tasks).map_err(|e| TaskError::Serialization(e.to_string()))
}

fn index_of(tasks: &[Task], id: &TaskId) -> Result<usize> {
    tasks
        .iter()
        .position(|t| &t.id == id)
        .ok_or_else(|| TaskError::task_not_found(id.as_str()))
}

/// Stop a running timer, returning the committed session length.
fn stop_timer(task: &mut Task, now: DateTime<Utc>) -> std::result::Result<u64, TimerError> {
    let session = task.time_tracking.session_time(now);
    task.time_tracking = task.time_tracking.stop(now)?;
    task.updated_at = now;
    Ok(session)
}

fn stopped_event(task: &Task, session_time: u64) -> TmsEvent {
    TmsEvent::TimerStopped {
        task_id: task.id.clone(),
        project_id: task.project_id.clone(),
        session_time,
        total_time: task.time_tracking.total_time,
    }
}

/// Move `task` to `to`, applying status side effects. Returns the session
/// length if a running timer had to be stopped.
fn apply_transition(
    task: &mut Task,
    to: TaskStatus,
    now: DateTime<Utc>,
) -> std::result::Result<Option<u64>, TimerError> {
    let from = task.status;
    let mut stopped = None;

    if to == TaskStatus::InProgress && task.started_at.is_none() {
        task.started_at = Some(now);
    }
    if to != TaskStatus::InProgress && task.time_tracking.is_active {
        stopped = Some(stop_timer(task, now)?);
    }
    if to == TaskStatus::Done && from != TaskStatus::Done {
        task.completed_at = Some(now);
    }
    if from == TaskStatus::Done && to != TaskStatus::Done {
        task.completed_at = None;
    }

    task.status = to;
    task.updated_at = now;
    Ok(stopped)
}

/// Repair loaded records so the store invariants hold. Returns whether
/// anything changed.
///
/// - timer state is normalized (active needs a start time)
/// - a timer running on a task that is not in progress is stopped
/// - if several timers run, only the most recently started one survives
/// - `completedAt` is present exactly on `done` tasks; a missing one is
///   taken from the stored `updatedAt`
fn normalize(tasks: &mut [Task], now: DateTime<Utc>) -> bool {
    let mut changed = false;

    for task in tasks.iter_mut() {
        match (task.status, task.completed_at) {
            (TaskStatus::Done, None) => {
                task.completed_at = Some(task.updated_at);
                changed = true;
            }
            (status, Some(_)) if status != TaskStatus::Done => {
                debug!(task_id = %task.id, status = %status, "clearing completedAt on unfinished task");
                task.completed_at = None;
                changed = true;
            }
            _ => {}
        }
        let tt = task.time_tracking.clone().normalized();
        if tt != task.time_tracking {
            task.time_tracking = tt;
            changed = true;
        }
        if task.time_tracking.is_active && task.status != TaskStatus::InProgress {
            warn!(task_id = %task.id, status = %task.status, "timer running outside in-progress, stopping");
            changed |= stop_timer(task, now).is_ok();
        }
    }

    let keep = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_timer_active())
        .max_by_key(|(_, t)| t.time_tracking.last_started)
        .map(|(i, _)| i);
    if let Some(keep) = keep {
        for (i, task) in tasks.iter_mut().enumerate() {
            if i != keep && task.is_timer_active() {
                warn!(task_id = %task.id, "more than one active timer loaded, stopping older one");
                changed |= stop_timer(task, now).is_ok();
            }
        }
    }

    changed
}

// ─────────────────────────────────────────────────────────────────────────────
// TaskStore
// ─────────────────────────────────────────────────────────────────────────────

impl TaskStore {
    /// Open the store, loading and normalizing the `tasks` collection.
    pub async fn open(
        gateway: Arc<dyn PersistenceGateway>,
        bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let store = Self {
            tasks: Mutex::new(Vec::new()),
            gateway,
            bus,
            clock,
        };
        let _ = store.reload().await?;
        Ok(store)
    }

    /// Re-read the `tasks` collection, replacing in-memory state.
    ///
    /// Repairs made during normalization are written back; if that write
    /// fails the repaired view is still used and the failure is logged.
    pub async fn reload(&self) -> Result<usize> {
        let mut guard = self.tasks.lock().await;
        let mut loaded = decode_tasks(self.gateway.read(Collection::Tasks).await?)?;
        if normalize(&mut loaded, self.clock.now()) {
            let value = encode_tasks(&loaded)?;
            if let Err(e) = self.gateway.write(Collection::Tasks, &value).await {
                warn!(error = %e, "failed to persist normalized tasks");
            }
        }
        let count = loaded.len();
        *guard = loaded;
        debug!(count, backend = self.gateway.backend(), "loaded tasks");
        Ok(count)
    }

    /// Write `next` and swap it in. On failure nothing changes.
    async fn commit(&self, guard: &mut MutexGuard<'_, Vec<Task>>, next: Vec<Task>) -> Result<()> {
        let value = encode_tasks(&next)?;
        if let Err(e) = self.gateway.write(Collection::Tasks, &value).await {
            warn!(error = %e, backend = self.gateway.backend(), "task write failed, change discarded");
            return Err(e.into());
        }
        **guard = next;
        Ok(())
    }

    fn publish(&self, events: Vec<TmsEvent>) {
        for event in events {
            let _ = self.bus.publish(event);
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Look up a task.
    pub async fn get(&self, id: &TaskId) -> Result<Task> {
        let tasks = self.tasks.lock().await;
        let idx = index_of(&tasks, id)?;
        Ok(tasks[idx].clone())
    }

    /// All tasks, in insertion order.
    pub async fn list(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    /// Tasks belonging to one project.
    pub async fn list_for_project(&self, project_id: &ProjectId) -> Vec<Task> {
        self.tasks
            .lock()
            .await
            .iter()
            .filter(|t| &t.project_id == project_id)
            .cloned()
            .collect()
    }

    /// The task whose timer is running, if any.
    pub async fn active_task(&self) -> Option<Task> {
        self.tasks
            .lock()
            .await
            .iter()
            .find(|t| t.is_timer_active())
            .cloned()
    }

    /// Elapsed-time snapshot of the running timer at `now`. Never mutates.
    pub async fn active_timer(&self, now: DateTime<Utc>) -> Option<ActiveTimer> {
        let task = self.active_task().await?;
        let tt = &task.time_tracking;
        Some(ActiveTimer {
            session_time: tt.session_time(now),
            elapsed: tt.elapsed(now),
            total_time: tt.total_time,
            title: task.title,
            task_id: task.id,
            project_id: task.project_id,
        })
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create a task. An explicit initial status gets the same side effects
    /// as a transition from `todo`.
    pub async fn create(&self, params: TaskCreateParams) -> Result<Task> {
        let title = params.title.trim();
        if title.is_empty() {
            return Err(TaskError::Validation("Task title is required".into()));
        }
        let now = self.clock.now();
        let mut task = Task {
            id: TaskId::new(),
            project_id: params.project_id,
            title: title.to_string(),
            description: non_blank(params.description),
            assignee: non_blank(params.assignee),
            due_date: non_blank(params.due_date),
            priority: params.priority.unwrap_or_default(),
            status: TaskStatus::Todo,
            started_at: None,
            completed_at: None,
            notes: Vec::new(),
            time_tracking: TimeTracking::default(),
            created_at: now,
            updated_at: now,
        };
        if let Some(status) = params.status {
            let _ = apply_transition(&mut task, status, now)?;
        }

        let mut guard = self.tasks.lock().await;
        let mut next = guard.clone();
        next.push(task.clone());
        self.commit(&mut guard, next).await?;

        info!(task_id = %task.id, project_id = %task.project_id, status = %task.status, "task created");
        self.publish(vec![TmsEvent::TaskCreated(task.clone())]);
        Ok(task)
    }

    /// Merge field changes into a task. Never changes status.
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task> {
        let title = match patch.title {
            Some(ref t) if t.trim().is_empty() => {
                return Err(TaskError::Validation("Task title is required".into()));
            }
            Some(ref t) => Some(t.trim().to_string()),
            None => None,
        };

        let mut guard = self.tasks.lock().await;
        let idx = index_of(&guard, id)?;
        let now = self.clock.now();
        let mut next = guard.clone();
        let task = &mut next[idx];

        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = non_blank(Some(description));
        }
        if let Some(assignee) = patch.assignee {
            task.assignee = non_blank(Some(assignee));
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = non_blank(Some(due_date));
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        task.updated_at = now;
        let updated = task.clone();

        self.commit(&mut guard, next).await?;
        debug!(task_id = %id, "task updated");
        self.publish(vec![TmsEvent::TaskUpdated(updated.clone())]);
        Ok(updated)
    }

    /// Move a task to another column.
    ///
    /// Moving to the current status is a no-op: nothing is written, no
    /// event is published and `updatedAt` is unchanged.
    pub async fn transition(&self, id: &TaskId, to: TaskStatus) -> Result<Task> {
        let mut guard = self.tasks.lock().await;
        let idx = index_of(&guard, id)?;
        let from = guard[idx].status;
        if from == to {
            return Ok(guard[idx].clone());
        }

        let now = self.clock.now();
        let mut next = guard.clone();
        let stopped = apply_transition(&mut next[idx], to, now)?;
        let updated = next[idx].clone();

        self.commit(&mut guard, next).await?;
        info!(task_id = %id, %from, %to, "task status changed");
        let mut events = Vec::with_capacity(2);
        if let Some(session) = stopped {
            events.push(stopped_event(&updated, session));
        }
        events.push(TmsEvent::TaskUpdated(updated.clone()));
        self.publish(events);
        Ok(updated)
    }

    /// Start or stop a task's timer.
    ///
    /// Only in-progress tasks can be timed. Starting stops whichever other
    /// timer is running first; both changes are committed in one write.
    pub async fn toggle_timer(&self, id: &TaskId) -> Result<Task> {
        let mut guard = self.tasks.lock().await;
        let idx = index_of(&guard, id)?;
        if guard[idx].status != TaskStatus::InProgress {
            return Err(TaskError::InvalidState(format!(
                "timer can only run on an in-progress task (task is {})",
                guard[idx].status
            )));
        }

        let now = self.clock.now();
        let mut next = guard.clone();
        let mut events = Vec::new();

        if next[idx].is_timer_active() {
            let session = stop_timer(&mut next[idx], now)?;
            events.push(stopped_event(&next[idx], session));
            events.push(TmsEvent::TaskUpdated(next[idx].clone()));
            info!(task_id = %id, session_ms = session, "timer stopped");
        } else {
            for other in next.iter_mut().filter(|t| t.is_timer_active()) {
                let session = stop_timer(other, now)?;
                info!(task_id = %other.id, session_ms = session, "paused running timer");
                events.push(stopped_event(other, session));
                events.push(TmsEvent::TaskUpdated(other.clone()));
            }
            let task = &mut next[idx];
            task.time_tracking = task.time_tracking.start(now)?;
            if task.started_at.is_none() {
                task.started_at = Some(now);
            }
            task.updated_at = now;
            events.push(TmsEvent::TimerStarted {
                task_id: task.id.clone(),
                project_id: task.project_id.clone(),
                started_at: now,
                total_time: task.time_tracking.total_time,
            });
            events.push(TmsEvent::TaskUpdated(task.clone()));
            info!(task_id = %id, "timer started");
        }

        let updated = next[idx].clone();
        self.commit(&mut guard, next).await?;
        self.publish(events);
        Ok(updated)
    }

    /// Append a note.
    pub async fn add_note(&self, id: &TaskId, text: &str) -> Result<Task> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskError::Validation("Note text is required".into()));
        }

        let mut guard = self.tasks.lock().await;
        let idx = index_of(&guard, id)?;
        let now = self.clock.now();
        let note = TaskNote {
            id: NoteId::new(),
            text: text.to_string(),
            created_at: now,
        };
        let mut next = guard.clone();
        next[idx].notes.push(note.clone());
        next[idx].updated_at = now;
        let updated = next[idx].clone();

        self.commit(&mut guard, next).await?;
        debug!(task_id = %id, note_id = %note.id, "note added");
        self.publish(vec![
            TmsEvent::TaskNoteAdded {
                task_id: id.clone(),
                note,
            },
            TmsEvent::TaskUpdated(updated.clone()),
        ]);
        Ok(updated)
    }

    /// Remove a task. Returns `false` if it did not exist.
    pub async fn delete(&self, id: &TaskId) -> Result<bool> {
        let mut guard = self.tasks.lock().await;
        let Ok(idx) = index_of(&guard, id) else {
            return Ok(false);
        };
        let mut next = guard.clone();
        let removed = next.remove(idx);

        self.commit(&mut guard, next).await?;
        info!(task_id = %id, project_id = %removed.project_id, "task deleted");
        self.publish(vec![TmsEvent::TaskDeleted {
            task_id: removed.id,
            project_id: removed.project_id,
        }]);
        Ok(true)
    }

    /// Remove every task of a project in one write and one event.
    ///
    /// Returns the number removed; zero means nothing was written or
    /// published.
    pub async fn delete_all_for_project(&self, project_id: &ProjectId) -> Result<usize> {
        let mut guard = self.tasks.lock().await;
        let (removed, kept): (Vec<Task>, Vec<Task>) = guard
            .iter()
            .cloned()
            .partition(|t| &t.project_id == project_id);
        if removed.is_empty() {
            return Ok(0);
        }

        self.commit(&mut guard, kept).await?;
        let count = removed.len();
        info!(project_id = %project_id, count, "project tasks deleted");
        self.publish(vec![TmsEvent::TasksBatchDeleted {
            project_id: project_id.clone(),
            task_ids: removed.into_iter().map(|t| t.id).collect(),
        }]);
        Ok(count)
    }

    /// Stop the running timer at teardown so its session is not lost.
    ///
    /// Best effort: if the write fails the session is lost and the error is
    /// returned for logging; there is no retry. Returns the stopped task.
    pub async fn flush_active_timer_on_unload(&self, now: DateTime<Utc>) -> Result<Option<Task>> {
        let mut guard = self.tasks.lock().await;
        let Some(idx) = guard.iter().position(Task::is_timer_active) else {
            return Ok(None);
        };
        let mut next = guard.clone();
        let session = stop_timer(&mut next[idx], now)?;
        let updated = next[idx].clone();

        self.commit(&mut guard, next).await?;
        info!(task_id = %updated.id, session_ms = session, "flushed active timer on unload");
        self.publish(vec![
            stopped_event(&updated, session),
            TmsEvent::TaskUpdated(updated.clone()),
        ]);
        Ok(Some(updated))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
