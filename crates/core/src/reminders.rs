//! Lesson reminder rules: wording, windows, and lookahead bounds.
//!
//! Both the autonomous scheduler and the on-demand "check now" trigger
//! build reminders through these functions so that their notifications
//! deduplicate against each other.

use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// How often the autonomous scheduler polls for due lessons.
pub const DEFAULT_POLL_INTERVAL: StdDuration = StdDuration::from_secs(30);

/// Lookahead used by the autonomous scheduler, in minutes.
pub const DEFAULT_LOOKAHEAD_MINS: i64 = 6;

/// Lookahead used by the on-demand trigger when the caller omits one.
pub const DEFAULT_ON_DEMAND_LOOKAHEAD_MINS: i64 = 15;

/// Smallest accepted on-demand lookahead, in minutes.
pub const MIN_LOOKAHEAD_MINS: i64 = 1;

/// Largest accepted on-demand lookahead, in minutes.
pub const MAX_LOOKAHEAD_MINS: i64 = 180;

/// Trailing window in which an equivalent reminder suppresses a new one.
pub const DEFAULT_DEDUP_WINDOW_MINS: i64 = 30;

/// Client route every lesson reminder links to.
pub const SCHEDULE_URL: &str = "/schedule";

/// Room placeholder when a timeslot has no room assigned.
const ROOM_PLACEHOLDER: &str = "ауд.";

/// Forward horizon within which lessons count as "starting soon".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookahead(Duration);

impl Lookahead {
    /// Validate a caller-supplied lookahead in minutes (1..=180).
    pub fn from_minutes(minutes: i64) -> Result<Self, CoreError> {
        if !(MIN_LOOKAHEAD_MINS..=MAX_LOOKAHEAD_MINS).contains(&minutes) {
            return Err(CoreError::Validation(format!(
                "lookahead_minutes must be between {MIN_LOOKAHEAD_MINS} and {MAX_LOOKAHEAD_MINS}, got {minutes}"
            )));
        }
        Ok(Self(Duration::minutes(minutes)))
    }

    /// The autonomous scheduler's lookahead.
    pub fn scheduler_default() -> Self {
        Self(Duration::minutes(DEFAULT_LOOKAHEAD_MINS))
    }

    pub fn duration(self) -> Duration {
        self.0
    }

    /// Inclusive end of the window that starts at `now`.
    pub fn horizon(self, now: Timestamp) -> Timestamp {
        now + self.0
    }
}

/// Notification title for a lesson. Also the deduplication key together
/// with [`SCHEDULE_URL`].
pub fn lesson_title(subject: &str) -> String {
    format!("Скоро пара: {subject}")
}

/// Notification body, e.g. `"Лекция в 301, начало в 10:00"`.
pub fn lesson_body(lesson_type: Option<&str>, room: Option<&str>, start: Timestamp) -> String {
    let lesson_type = lesson_type.unwrap_or_default();
    let room = room
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(ROOM_PLACEHOLDER);
    let body = format!("{lesson_type} в {room}, начало в {}", start.format("%H:%M"));
    body.trim_start().to_string()
}

/// Start of the trailing dedup window ending at `now`.
pub fn dedup_since(now: Timestamp, window: Duration) -> Timestamp {
    now - window
}
