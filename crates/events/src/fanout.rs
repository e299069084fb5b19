//! Notification fan-out: one in-app row per recipient, then Web Push.

use std::collections::HashSet;
use std::sync::Arc;

use campus_core::types::{DbId, Timestamp};
use campus_db::models::notification::NotificationDraft;
use campus_db::repositories::NotificationRepo;
use campus_db::DbPool;
use chrono::Utc;

use crate::delivery::PushMessage;
use crate::dispatcher::PushDispatcher;

/// Creates notifications for a set of users and forwards them to push.
#[derive(Clone)]
pub struct NotificationFanout {
    pool: DbPool,
    dispatcher: Option<Arc<PushDispatcher>>,
}

impl NotificationFanout {
    /// `dispatcher` is `None` when Web Push is not configured.
    pub fn new(pool: DbPool, dispatcher: Option<Arc<PushDispatcher>>) -> Self {
        Self { pool, dispatcher }
    }

    /// Fan out a draft stamped with the current time.
    pub async fn fan_out(
        &self,
        draft: &NotificationDraft,
        recipients: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        self.fan_out_at(draft, recipients, Utc::now()).await
    }

    /// Insert one notification per distinct recipient in a single
    /// transaction, then schedule push delivery for their active
    /// subscriptions.
    ///
    /// Returns the number of rows created. Push problems are logged and
    /// never affect the result.
    pub async fn fan_out_at(
        &self,
        draft: &NotificationDraft,
        recipients: &[DbId],
        created_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let mut seen = HashSet::with_capacity(recipients.len());
        let recipients: Vec<DbId> = recipients
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if recipients.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let created =
            NotificationRepo::insert_for_users(&mut tx, draft, &recipients, created_at).await?;
        tx.commit().await?;

        tracing::debug!(title = %draft.title, created, "Notifications created");

        if let Some(dispatcher) = &self.dispatcher {
            let message = PushMessage {
                body: draft.body.clone(),
                url: draft.url.clone(),
                kind: draft.notification_type.clone(),
                ..PushMessage::new(draft.title.clone())
            };
            dispatcher.dispatch_to_users(recipients, message);
        }

        Ok(created)
    }
}
