//! Lesson reminder generation.
//!
//! [`ReminderGenerator`] finds timeslots starting within the lookahead
//! window and notifies every active member of the owning group who has not
//! already been reminded inside the dedup window. The autonomous scheduler
//! and the on-demand HTTP trigger share this path, so reminders from one
//! suppress reminders from the other.

use campus_core::kinds::KIND_LESSON;
use campus_core::reminders::{
    dedup_since, lesson_body, lesson_title, Lookahead, DEFAULT_DEDUP_WINDOW_MINS, SCHEDULE_URL,
};
use campus_core::types::{DbId, Timestamp};
use campus_db::models::notification::NotificationDraft;
use campus_db::models::schedule::ScheduleEntry;
use campus_db::repositories::{ScheduleRepo, UserRepo};
use campus_db::DbPool;
use chrono::Duration;

use crate::dedup::{DedupKey, DedupStore};
use crate::fanout::NotificationFanout;

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// ReminderGenerator
// ---------------------------------------------------------------------------

pub struct ReminderGenerator {
    pool: DbPool,
    dedup: DedupStore,
    fanout: NotificationFanout,
    dedup_window: Duration,
}

impl ReminderGenerator {
    pub fn new(pool: DbPool, fanout: NotificationFanout) -> Self {
        Self {
            dedup: DedupStore::new(pool.clone()),
            pool,
            fanout,
            dedup_window: Duration::minutes(DEFAULT_DEDUP_WINDOW_MINS),
        }
    }

    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    /// Remind every group with a lesson starting in `[now, now + lookahead]`.
    ///
    /// Returns the number of notifications created.
    pub async fn generate_due_reminders(
        &self,
        now: Timestamp,
        lookahead: Lookahead,
    ) -> Result<u64, ReminderError> {
        let entries =
            ScheduleRepo::list_starting_between(&self.pool, now, lookahead.horizon(now)).await?;

        let mut created = 0;
        for entry in &entries {
            let members = UserRepo::active_ids_in_group(&self.pool, entry.group_id).await?;
            created += self.remind(entry, &members, now).await?;
        }

        if created > 0 {
            tracing::info!(lessons = entries.len(), created, "Lesson reminders sent");
        }
        Ok(created)
    }

    /// On-demand variant: lessons of `group_id` starting within the window,
    /// reminding only `user_id`.
    pub async fn check_for_user(
        &self,
        user_id: DbId,
        group_id: DbId,
        now: Timestamp,
        lookahead: Lookahead,
    ) -> Result<u64, ReminderError> {
        let entries = ScheduleRepo::list_for_group_starting_between(
            &self.pool,
            group_id,
            now,
            lookahead.horizon(now),
        )
        .await?;

        let mut created = 0;
        for entry in &entries {
            created += self.remind(entry, &[user_id], now).await?;
        }

        if created > 0 {
            tracing::info!(user_id, group_id, created, "On-demand lesson reminders sent");
        }
        Ok(created)
    }

    async fn remind(
        &self,
        entry: &ScheduleEntry,
        candidates: &[DbId],
        now: Timestamp,
    ) -> Result<u64, ReminderError> {
        if candidates.is_empty() {
            return Ok(0);
        }

        let draft = lesson_draft(entry);
        let key = DedupKey::new(draft.title.clone(), SCHEDULE_URL);
        let fresh = self
            .dedup
            .filter_fresh(candidates, &key, dedup_since(now, self.dedup_window))
            .await?;
        if fresh.is_empty() {
            tracing::debug!(schedule_entry_id = entry.id, "Lesson reminder already sent");
            return Ok(0);
        }

        Ok(self.fanout.fan_out_at(&draft, &fresh, now).await?)
    }
}

fn lesson_draft(entry: &ScheduleEntry) -> NotificationDraft {
    NotificationDraft {
        title: lesson_title(&entry.subject),
        body: Some(lesson_body(
            entry.lesson_type.as_deref(),
            entry.room.as_deref(),
            entry.start_time,
        )),
        notification_type: Some(KIND_LESSON.to_string()),
        url: Some(SCHEDULE_URL.to_string()),
    }
}
