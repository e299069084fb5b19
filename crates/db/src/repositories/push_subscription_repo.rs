//! Repository for the `push_subscriptions` table.

use campus_core::types::DbId;
use sqlx::PgPool;

use crate::models::push_subscription::{PushSubscription, UpsertPushSubscription};

/// Column list for `push_subscriptions` queries.
const COLUMNS: &str = "id, endpoint, p256dh, auth, user_id, active, created_at, updated_at";

/// Provides subscription registration and delivery-target lookups.
pub struct PushSubscriptionRepo;

impl PushSubscriptionRepo {
    /// Register an endpoint, or re-bind and reactivate it if it is already
    /// known (browsers reuse endpoints across sign-ins).
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertPushSubscription,
    ) -> Result<PushSubscription, sqlx::Error> {
        let query = format!(
            "INSERT INTO push_subscriptions (endpoint, p256dh, auth, user_id, active) \
             VALUES ($1, $2, $3, $4, true) \
             ON CONFLICT (endpoint) DO UPDATE SET \
                p256dh = EXCLUDED.p256dh, \
                auth = EXCLUDED.auth, \
                user_id = EXCLUDED.user_id, \
                active = true, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(&input.endpoint)
            .bind(&input.p256dh)
            .bind(&input.auth)
            .bind(input.user_id)
            .fetch_one(pool)
            .await
    }

    /// Soft-deactivate a user's subscription for an endpoint.
    ///
    /// Returns `true` if a row was updated.
    pub async fn deactivate(
        pool: &PgPool,
        endpoint: &str,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE push_subscriptions \
             SET active = false, updated_at = NOW() \
             WHERE endpoint = $1 AND user_id = $2",
        )
        .bind(endpoint)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active subscriptions belonging to any of `user_ids`.
    pub async fn list_active_for_users(
        pool: &PgPool,
        user_ids: &[DbId],
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM push_subscriptions \
             WHERE active = true AND user_id = ANY($1) \
             ORDER BY id"
        );
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(user_ids)
            .fetch_all(pool)
            .await
    }

    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        Self::list_active_for_users(pool, &[user_id]).await
    }

    /// Every active subscription (admin broadcast).
    pub async fn list_all_active(pool: &PgPool) -> Result<Vec<PushSubscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM push_subscriptions WHERE active = true ORDER BY id"
        );
        sqlx::query_as::<_, PushSubscription>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PushSubscription>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM push_subscriptions WHERE id = $1");
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete a subscription whose endpoint the push service reported
    /// as gone. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
