//! Access window math.
//!
//! A resolved window is a pair of local clock times compared at minute
//! granularity against `[start, end)`. A start later than the end wraps past
//! midnight.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Result of evaluating the window against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    /// The wall clock is not synchronised, so the window cannot be evaluated.
    Unknown,
    Allowed,
    Blocked,
}

impl WindowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowState::Unknown => "unknown",
            WindowState::Allowed => "allowed",
            WindowState::Blocked => "blocked",
        }
    }
}

/// Meaning of a window whose start and end are the same minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqualBoundsPolicy {
    #[default]
    AlwaysOn,
    AlwaysOff,
}

/// How [`WindowState::Unknown`] is treated when deciding whether to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsyncedPolicy {
    #[default]
    Block,
    Allow,
}

impl UnsyncedPolicy {
    /// Collapse a window state into a yes/no answer.
    pub fn permits(&self, state: WindowState) -> bool {
        match state {
            WindowState::Allowed => true,
            WindowState::Blocked => false,
            WindowState::Unknown => *self == UnsyncedPolicy::Allow,
        }
    }
}

/// A fully resolved window for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Type strings as given by the schedule description.
    pub start_type: String,
    pub end_type: String,
    pub enabled: bool,
}

impl ResolvedWindow {
    /// Evaluate against a local clock time.
    pub fn state_at(&self, local: NaiveTime, policy: EqualBoundsPolicy) -> WindowState {
        if self.enabled && is_within_window(self.start, self.end, local, policy) {
            WindowState::Allowed
        } else {
            WindowState::Blocked
        }
    }

    /// `Start: HH:MM (type), End: HH:MM (type)`
    pub fn summary(&self) -> String {
        format!(
            "Start: {} ({}), End: {} ({})",
            self.start.format("%H:%M"),
            self.start_type,
            self.end.format("%H:%M"),
            self.end_type
        )
    }
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Whether `now` falls inside `[start, end)` at minute granularity.
pub fn is_within_window(
    start: NaiveTime,
    end: NaiveTime,
    now: NaiveTime,
    policy: EqualBoundsPolicy,
) -> bool {
    let (start, end, now) = (minute_of_day(start), minute_of_day(end), minute_of_day(now));

    match start.cmp(&end) {
        std::cmp::Ordering::Equal => policy == EqualBoundsPolicy::AlwaysOn,
        // Overnight
        std::cmp::Ordering::Greater => now >= start || now < end,
        std::cmp::Ordering::Less => now >= start && now < end,
    }
}
