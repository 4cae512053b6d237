//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use ptms_core::{Project, Task, TaskStatus, format_duration};
use ptms_tasks::{ActiveTimer, Board};

fn column_title(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "To Do",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::Review => "Review",
        TaskStatus::Done => "Done",
    }
}

/// One line per task: id, priority, title and tracked time.
pub fn task_line(task: &Task, now: DateTime<Utc>) -> String {
    let mut line = format!("{}  [{}] {}", task.id, task.priority, task.title);
    let tracked = task.time_tracking.elapsed(now);
    if tracked > 0 {
        let _ = write!(line, "  {}", format_duration(tracked));
    }
    if task.is_timer_active() {
        line.push_str("  (running)");
    }
    if let Some(due) = &task.due_date {
        let _ = write!(line, "  due {due}");
    }
    line
}

/// Columns in board order followed by the counts.
pub fn board(board: &Board, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    for &status in TaskStatus::ALL {
        let column = board.column(status);
        let _ = writeln!(out, "{} ({})", column_title(status), column.len());
        for task in column {
            let _ = writeln!(out, "  {}", task_line(task, now));
        }
    }
    let _ = write!(out, "total: {}", board.counts.total);
    out
}

/// Running timer summary.
pub fn timer(timer: &ActiveTimer) -> String {
    format!(
        "{} {}  session {}  total {}",
        timer.task_id,
        timer.title,
        format_duration(timer.session_time),
        format_duration(timer.elapsed)
    )
}

/// One line per project.
pub fn project_line(project: &Project) -> String {
    format!("{}  {} ({})", project.id, project.name, project.status)
}
