//! Time-tracking engine for a single task timer.
//!
//! A [`TimeTracking`] value is a two-state machine (active / inactive). All
//! operations are pure: they take the current state and a `now` timestamp
//! and return the next state, never touching a clock themselves.
//!
//! Invariants:
//! - `is_active` implies `last_started` is set.
//! - `total_time` only grows; every stop adds a non-negative session delta.
//! - A clock that runs backwards (`now < last_started`) yields a zero-length
//!   session rather than a negative one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Timer toggle failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TimerError {
    /// `start` on a timer that is already running.
    #[error("timer is already active")]
    AlreadyActive,
    /// `stop` on a timer that is not running.
    #[error("timer is not active")]
    NotActive,
}

/// Embedded timer state of a task (`timeTracking` on the wire).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeTracking {
    /// Whether a session is currently running.
    #[serde(deserialize_with = "crate::model::null_as_default")]
    pub is_active: bool,
    /// Committed time in milliseconds, excluding the running session.
    #[serde(deserialize_with = "crate::model::null_as_default")]
    pub total_time: u64,
    /// Start of the running session.
    #[serde(with = "crate::timestamp::option")]
    pub last_started: Option<DateTime<Utc>>,
}

/// Milliseconds between `from` and `to`, clamped at zero.
fn session_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_milliseconds()).unwrap_or(0)
}

impl TimeTracking {
    /// Length of the running session at `now` (zero when inactive).
    pub fn session_time(&self, now: DateTime<Utc>) -> u64 {
        match (self.is_active, self.last_started) {
            (true, Some(started)) => session_ms(started, now),
            _ => 0,
        }
    }

    /// Total tracked time at `now`, including the running session.
    ///
    /// Never less than `total_time`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> u64 {
        self.total_time.saturating_add(self.session_time(now))
    }

    /// Start a session at `now`.
    pub fn start(&self, now: DateTime<Utc>) -> Result<Self, TimerError> {
        if self.is_active {
            return Err(TimerError::AlreadyActive);
        }
        Ok(Self {
            is_active: true,
            total_time: self.total_time,
            last_started: Some(now),
        })
    }

    /// Stop the running session at `now`, committing its length.
    pub fn stop(&self, now: DateTime<Utc>) -> Result<Self, TimerError> {
        if !self.is_active {
            return Err(TimerError::NotActive);
        }
        Ok(Self {
            is_active: false,
            total_time: self.elapsed(now),
            last_started: None,
        })
    }

    /// Repair states that violate `is_active ⇒ last_started`.
    ///
    /// An active timer without a start time cannot be measured, so it is
    /// read as inactive with its committed time intact.
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.is_active && self.last_started.is_none() {
            warn!(total_time = self.total_time, "active timer without start time, marking inactive");
            return Self {
                is_active: false,
                ..self
            };
        }
        if !self.is_active && self.last_started.is_some() {
            return Self {
                last_started: None,
                ..self
            };
        }
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
