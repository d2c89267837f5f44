//! Reminder lead-time window.
//!
//! The sweep reminds seekers about events starting roughly one hour from
//! now. The window is ten minutes wide so a sweep cadence of up to ten
//! minutes neither skips nor overlaps events.

use chrono::Duration;

use crate::types::Timestamp;

/// Minutes ahead of `now` at which the window opens.
pub const WINDOW_OPEN_MINUTES: i64 = 55;

/// Minutes ahead of `now` at which the window closes.
pub const WINDOW_CLOSE_MINUTES: i64 = 65;

/// Inclusive `[start, end]` range of event start times to remind about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl ReminderWindow {
    /// The window `[now + 55min, now + 65min]`.
    pub fn ahead_of(now: Timestamp) -> Self {
        Self {
            start: now + Duration::minutes(WINDOW_OPEN_MINUTES),
            end: now + Duration::minutes(WINDOW_CLOSE_MINUTES),
        }
    }

    pub fn contains(&self, starts_at: Timestamp) -> bool {
        self.start <= starts_at && starts_at <= self.end
    }
}
