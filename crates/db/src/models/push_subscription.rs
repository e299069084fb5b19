//! Web Push subscription model.

use campus_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `push_subscriptions` table.
///
/// `p256dh` and `auth` are the browser's base64url-encoded public key and
/// auth secret.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PushSubscription {
    pub id: DbId,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_id: Option<DbId>,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering (or re-registering) a subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPushSubscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_id: DbId,
}
