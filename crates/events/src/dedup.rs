//! Trailing-window deduplication of notifications.
//!
//! A notification counts as a duplicate when the same user already has one
//! with the same title and url created inside the window. The lookup is a
//! plain read: two concurrent generators may both see "not yet notified"
//! and both insert.

use std::collections::HashSet;

use campus_core::types::{DbId, Timestamp};
use campus_db::repositories::NotificationRepo;
use campus_db::DbPool;

/// What makes two notifications "the same" for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub title: String,
    pub url: String,
}

impl DedupKey {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Batched "already notified?" queries over the notifications table.
#[derive(Clone)]
pub struct DedupStore {
    pool: DbPool,
}

impl DedupStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The subset of `candidates` that already received a notification
    /// matching `key` at or after `since`. One query per call.
    pub async fn already_notified(
        &self,
        candidates: &[DbId],
        key: &DedupKey,
        since: Timestamp,
    ) -> Result<HashSet<DbId>, sqlx::Error> {
        let ids = NotificationRepo::recipients_with_recent(
            &self.pool,
            candidates,
            &key.title,
            &key.url,
            since,
        )
        .await?;
        Ok(ids.into_iter().collect())
    }

    /// `candidates` minus [`already_notified`](Self::already_notified),
    /// in input order.
    pub async fn filter_fresh(
        &self,
        candidates: &[DbId],
        key: &DedupKey,
        since: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let seen = self.already_notified(candidates, key, since).await?;
        Ok(candidates
            .iter()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect())
    }
}
