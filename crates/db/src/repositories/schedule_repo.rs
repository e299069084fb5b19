//! Repository for the `schedule_entries` table.

use campus_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::schedule::{CreateScheduleEntry, ScheduleEntry};

/// Column list for `schedule_entries` queries.
const COLUMNS: &str = "id, group_id, subject, teacher, room, weekday, \
    start_time, end_time, parity, lesson_type, created_at";

/// Provides schedule lookups for reminder generation.
pub struct ScheduleRepo;

impl ScheduleRepo {
    /// Insert a timeslot. The `ck_schedule_entries_time_range` constraint
    /// rejects entries whose end is not after their start.
    pub async fn create(
        pool: &PgPool,
        input: &CreateScheduleEntry,
    ) -> Result<ScheduleEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO schedule_entries \
                (group_id, subject, teacher, room, weekday, start_time, end_time, parity, lesson_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScheduleEntry>(&query)
            .bind(input.group_id)
            .bind(&input.subject)
            .bind(&input.teacher)
            .bind(&input.room)
            .bind(&input.weekday)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.parity.as_str())
            .bind(&input.lesson_type)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ScheduleEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM schedule_entries WHERE id = $1");
        sqlx::query_as::<_, ScheduleEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All entries whose start time falls within `[from, to]` (inclusive),
    /// earliest first.
    pub async fn list_starting_between(
        pool: &PgPool,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<ScheduleEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM schedule_entries \
             WHERE start_time >= $1 AND start_time <= $2 \
             ORDER BY start_time ASC, id ASC"
        );
        sqlx::query_as::<_, ScheduleEntry>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Same as [`list_starting_between`](Self::list_starting_between),
    /// restricted to one group.
    pub async fn list_for_group_starting_between(
        pool: &PgPool,
        group_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<ScheduleEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM schedule_entries \
             WHERE group_id = $1 AND start_time >= $2 AND start_time <= $3 \
             ORDER BY start_time ASC, id ASC"
        );
        sqlx::query_as::<_, ScheduleEntry>(&query)
            .bind(group_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }
}
