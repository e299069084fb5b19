//! Repository for the `notifications` table.

use campus_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::notification::{Notification, NotificationDraft};

/// Column list for `notifications` queries.
const COLUMNS: &str =
    "id, user_id, title, body, notification_type, url, created_at, is_read, read_at";

/// Provides fan-out inserts, deduplication lookups and inbox queries.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Return the distinct subset of `user_ids` that already received a
    /// notification with this `title` and `url` at or after `since`.
    ///
    /// Issues a single query for the whole candidate set. An empty
    /// candidate set short-circuits without touching the database.
    pub async fn recipients_with_recent(
        pool: &PgPool,
        user_ids: &[DbId],
        title: &str,
        url: &str,
        since: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar(
            "SELECT DISTINCT user_id FROM notifications \
             WHERE user_id = ANY($1) \
               AND title = $2 \
               AND url = $3 \
               AND created_at >= $4",
        )
        .bind(user_ids)
        .bind(title)
        .bind(url)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    /// Insert one row per user id in a single statement.
    ///
    /// Runs on the caller's connection so the insert can share the
    /// caller's transaction. Returns the number of rows written.
    pub async fn insert_for_users(
        conn: &mut PgConnection,
        draft: &NotificationDraft,
        user_ids: &[DbId],
        created_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "INSERT INTO notifications \
                (user_id, title, body, notification_type, url, created_at, is_read) \
             SELECT recipient, $2, $3, $4, $5, $6, false \
             FROM UNNEST($1::BIGINT[]) AS recipients(recipient)",
        )
        .bind(user_ids)
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(&draft.notification_type)
        .bind(&draft.url)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// One page of a user's notifications, newest first.
    ///
    /// `before` is the `(created_at, id)` of the last row of the previous
    /// page. Ordering and comparison both use millisecond precision so they
    /// agree with the cursor encoding in `campus_core::cursor`.
    pub async fn list_page(
        pool: &PgPool,
        user_id: DbId,
        before: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let (before_at, before_id) = before.unzip();
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 \
               AND ($2::TIMESTAMPTZ IS NULL \
                    OR (date_trunc('milliseconds', created_at), id) < ($2, $3)) \
             ORDER BY date_trunc('milliseconds', created_at) DESC, id DESC \
             LIMIT $4"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(before_at)
            .bind(before_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Number of unread notifications for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Mark a single notification as read.
    ///
    /// Returns `true` if the notification exists and belongs to the user.
    /// Marking an already-read notification keeps its original `read_at`.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all unread notifications as read for a user.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
