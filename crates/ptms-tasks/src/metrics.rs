//! Completion and time-tracking summaries.
//!
//! Everything here works on committed `totalTime`; a running session is not
//! counted until it is stopped.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use ptms_core::{Task, TaskStatus};
use serde::Serialize;

/// Aggregate numbers for one project.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetrics {
    /// All tasks.
    pub total: usize,
    /// Tasks in `todo`.
    pub todo: usize,
    /// Tasks in `in-progress`.
    pub in_progress: usize,
    /// Tasks in `review`.
    pub review: usize,
    /// Tasks in `done`.
    pub done: usize,
    /// `done / total` as a whole percentage, 0 when there are no tasks.
    pub completion_percent: u8,
    /// Sum of committed time across all tasks, in milliseconds.
    pub total_time_ms: u64,
    /// Mean committed time of done tasks, in milliseconds.
    pub avg_completed_time_ms: u64,
}

impl ProjectMetrics {
    /// Compute metrics over `tasks`.
    pub fn compute(tasks: &[Task]) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        let total = tasks.len();
        let done = count(TaskStatus::Done);

        let completed_time: Vec<u64> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .map(|t| t.time_tracking.total_time)
            .collect();

        Self {
            total,
            todo: count(TaskStatus::Todo),
            in_progress: count(TaskStatus::InProgress),
            review: count(TaskStatus::Review),
            done,
            completion_percent: percent(done, total),
            total_time_ms: tasks.iter().map(|t| t.time_tracking.total_time).sum(),
            avg_completed_time_ms: mean(&completed_time),
        }
    }
}

/// Per-status productivity row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusProductivity {
    /// Column.
    pub status: TaskStatus,
    /// Tasks in the column.
    pub count: usize,
    /// Committed time, in milliseconds.
    pub total_time_ms: u64,
    /// Mean committed time per task, in milliseconds.
    pub avg_time_ms: u64,
}

impl StatusProductivity {
    /// One row per status, in board order.
    pub fn compute(tasks: &[Task]) -> Vec<Self> {
        TaskStatus::ALL
            .iter()
            .map(|&status| {
                let times: Vec<u64> = tasks
                    .iter()
                    .filter(|t| t.status == status)
                    .map(|t| t.time_tracking.total_time)
                    .collect();
                Self {
                    status,
                    count: times.len(),
                    total_time_ms: times.iter().sum(),
                    avg_time_ms: mean(&times),
                }
            })
            .collect()
    }
}

/// Reporting window, applied to `updatedAt`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PeriodFilter {
    /// No bound.
    #[default]
    All,
    /// Since the first of the current month (UTC).
    Month,
    /// Since the most recent Sunday (UTC).
    Week,
}

impl PeriodFilter {
    /// Window start at `now`, or `None` for no bound.
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let date = now.date_naive();
        match self {
            Self::All => None,
            Self::Month => date
                .with_day(1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| Utc.from_utc_datetime(&d)),
            Self::Week => {
                let back = i64::from(date.weekday().num_days_from_sunday());
                (date - Duration::days(back))
                    .and_hms_opt(0, 0, 0)
                    .map(|d| Utc.from_utc_datetime(&d))
            }
        }
    }

    /// Tasks updated within the window.
    pub fn apply(self, tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
        match self.start(now) {
            None => tasks.to_vec(),
            Some(start) => tasks
                .iter()
                .filter(|t| t.updated_at >= start)
                .cloned()
                .collect(),
        }
    }
}

impl std::str::FromStr for PeriodFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "month" => Ok(Self::Month),
            "week" => Ok(Self::Week),
            other => Err(format!("unknown period: {other} (expected all, month or week)")),
        }
    }
}

fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let rounded = (part * 200 + whole) / (whole * 2);
    u8::try_from(rounded).unwrap_or(100)
}

fn mean(values: &[u64]) -> u64 {
    match u64::try_from(values.len()) {
        Ok(0) | Err(_) => 0,
        Ok(n) => values.iter().sum::<u64>() / n,
    }
}
