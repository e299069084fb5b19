//! Handlers for the `/push` resource.
//!
//! Delivery is fire-and-forget: handlers hand messages to the
//! [`PushDispatcher`](campus_events::PushDispatcher) and answer with the
//! number of subscriptions scheduled, which is 0 when push is unconfigured.

use axum::extract::State;
use axum::Json;
use campus_core::kinds::{KIND_BROADCAST, KIND_TEST};
use campus_db::models::push_subscription::{PushSubscription, UpsertPushSubscription};
use campus_db::repositories::PushSubscriptionRepo;
use campus_events::delivery::{Urgency, DEFAULT_TTL_SECS};
use campus_events::PushMessage;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

const TEST_TITLE: &str = "Тестовое уведомление";
const TEST_BODY: &str = "Проверка доставки";
const TEST_URL: &str = "/";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Browser `PushSubscription.toJSON()` shape.
#[derive(Debug, Deserialize)]
pub struct SubscribePayload {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// Trimmed subscription fields, validated before the upsert.
#[derive(Debug, Validate)]
struct SubscriptionInput {
    #[validate(length(min = 1, max = 2048))]
    endpoint: String,
    #[validate(length(min = 1, max = 200))]
    p256dh: String,
    #[validate(length(min = 1, max = 200))]
    auth: String,
}

/// Only the endpoint matters; browsers send the full subscription.
#[derive(Debug, Deserialize)]
pub struct UnsubscribePayload {
    pub endpoint: String,
}

/// Message content for `/push/test` and `/push/broadcast`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct NotifyBody {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[validate(range(max = 2_419_200))]
    pub ttl: Option<u32>,
    pub urgency: Option<Urgency>,
    #[validate(length(max = 32))]
    pub topic: Option<String>,
}

impl NotifyBody {
    fn into_message(self) -> PushMessage {
        PushMessage {
            title: self.title,
            body: self.body,
            url: self.url,
            tag: self.tag,
            kind: self.kind,
            ttl: self.ttl.unwrap_or(DEFAULT_TTL_SECS),
            urgency: Some(self.urgency.unwrap_or_default()),
            topic: self.topic,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicKeyResponse {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/push/public-key
///
/// No authentication; the key is public by definition.
pub async fn public_key(State(state): State<AppState>) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        key: state
            .vapid_public_key
            .as_deref()
            .unwrap_or_default()
            .to_string(),
    })
}

/// POST /api/v1/push/subscribe
///
/// Upserts by endpoint: an endpoint seen before is rebound to the caller
/// and reactivated.
pub async fn subscribe(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SubscribePayload>,
) -> AppResult<Json<serde_json::Value>> {
    let input = SubscriptionInput {
        endpoint: payload.endpoint.trim().to_string(),
        p256dh: payload.keys.p256dh.trim().to_string(),
        auth: payload.keys.auth.trim().to_string(),
    };
    if input.endpoint.is_empty() || input.p256dh.is_empty() || input.auth.is_empty() {
        return Err(AppError::BadRequest("invalid subscription".into()));
    }
    input.validate()?;

    let subscription = PushSubscriptionRepo::upsert(
        &state.pool,
        &UpsertPushSubscription {
            endpoint: input.endpoint,
            p256dh: input.p256dh,
            auth: input.auth,
            user_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        subscription_id = subscription.id,
        "Push subscription registered"
    );

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// POST /api/v1/push/unsubscribe
///
/// Deactivates the caller's subscription for the endpoint. Unknown
/// endpoints are not an error.
pub async fn unsubscribe(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UnsubscribePayload>,
) -> AppResult<Json<serde_json::Value>> {
    PushSubscriptionRepo::deactivate(&state.pool, payload.endpoint.trim(), auth.user_id).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// POST /api/v1/push/test
///
/// Pushes a message to the caller's own active subscriptions. The body is
/// optional; missing fields fall back to a generic test message.
pub async fn send_test(
    auth: AuthUser,
    State(state): State<AppState>,
    body: Option<Json<NotifyBody>>,
) -> AppResult<Json<DispatchResponse>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;

    let mut message = body.into_message();
    message.kind.get_or_insert_with(|| KIND_TEST.to_string());
    if message.title.trim().is_empty() {
        message.title = TEST_TITLE.to_string();
    }
    message.body = non_empty(message.body).or_else(|| Some(TEST_BODY.to_string()));
    message.url = non_empty(message.url).or_else(|| Some(TEST_URL.to_string()));

    let subscriptions = PushSubscriptionRepo::list_active_for_user(&state.pool, auth.user_id).await?;
    let count = dispatch(&state, subscriptions, message);

    tracing::debug!(user_id = auth.user_id, count, "Test push scheduled");
    Ok(Json(DispatchResponse { count }))
}

/// POST /api/v1/push/broadcast
///
/// Admin only. Pushes the message to every active subscription.
pub async fn broadcast(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<NotifyBody>,
) -> AppResult<Json<DispatchResponse>> {
    body.validate()?;

    let mut message = body.into_message();
    message.kind.get_or_insert_with(|| KIND_BROADCAST.to_string());

    let subscriptions = PushSubscriptionRepo::list_all_active(&state.pool).await?;
    let count = dispatch(&state, subscriptions, message);

    tracing::info!(admin_id = admin.user_id, count, "Broadcast push scheduled");
    Ok(Json(DispatchResponse { count }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dispatch(state: &AppState, subscriptions: Vec<PushSubscription>, message: PushMessage) -> usize {
    match &state.push {
        Some(dispatcher) => dispatcher.dispatch(subscriptions, message),
        None => 0,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
