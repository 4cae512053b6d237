//! Four-column board projection.
//!
//! A [`Board`] is a pure function of a task list: no hidden state, safe to
//! rebuild from any number of observers. It is always recomputed in full,
//! never patched.

use std::cmp::Ordering;

use ptms_core::{ProjectId, Task, TaskStatus};
use serde::Serialize;

/// Number of tasks per column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCounts {
    /// Tasks in `todo`.
    pub todo: usize,
    /// Tasks in `in-progress`.
    pub in_progress: usize,
    /// Tasks in `review`.
    pub review: usize,
    /// Tasks in `done`.
    pub done: usize,
    /// All tasks.
    pub total: usize,
}

/// Tasks grouped by status and sorted for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    /// `todo` column.
    pub todo: Vec<Task>,
    /// `in-progress` column.
    pub in_progress: Vec<Task>,
    /// `review` column.
    pub review: Vec<Task>,
    /// `done` column.
    pub done: Vec<Task>,
    /// Column sizes.
    pub counts: BoardCounts,
}

/// Display order within a column.
///
/// Running timer first, then priority (high → low), then due date
/// (earliest first, undated last), then newest first.
pub fn board_order(a: &Task, b: &Task) -> Ordering {
    b.is_timer_active()
        .cmp(&a.is_timer_active())
        .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
        .then_with(|| match (a.due_at(), b.due_at()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

impl Board {
    /// Partition and sort `tasks`.
    ///
    /// Status values were already normalized at deserialization, so a
    /// stored `"blocked"` arrives here as `todo`.
    pub fn project(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut board = Self::default();
        for task in tasks {
            board.column_mut(task.status).push(task);
        }
        for &status in TaskStatus::ALL {
            board.column_mut(status).sort_by(board_order);
        }
        board.counts = BoardCounts {
            todo: board.todo.len(),
            in_progress: board.in_progress.len(),
            review: board.review.len(),
            done: board.done.len(),
            total: board.todo.len() + board.in_progress.len() + board.review.len() + board.done.len(),
        };
        board
    }

    /// Project only the tasks belonging to `project_id`.
    pub fn for_project<'a>(tasks: impl IntoIterator<Item = &'a Task>, project_id: &ProjectId) -> Self {
        Self::project(
            tasks
                .into_iter()
                .filter(|t| &t.project_id == project_id)
                .cloned(),
        )
    }

    /// Tasks in one column.
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Review => &self.review,
            TaskStatus::Done => &self.done,
        }
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Review => &mut self.review,
            TaskStatus::Done => &mut self.done,
        }
    }
}
