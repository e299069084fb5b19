//! Schedule entry (class timeslot) model.

use campus_core::schedule::WeekParity;
use campus_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `schedule_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleEntry {
    pub id: DbId,
    pub group_id: DbId,
    pub subject: String,
    pub teacher: Option<String>,
    pub room: Option<String>,
    pub weekday: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub parity: String,
    pub lesson_type: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a schedule entry.
#[derive(Debug, Deserialize)]
pub struct CreateScheduleEntry {
    pub group_id: DbId,
    pub subject: String,
    pub teacher: Option<String>,
    pub room: Option<String>,
    pub weekday: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub parity: WeekParity,
    pub lesson_type: Option<String>,
}
