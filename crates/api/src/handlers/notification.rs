//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`].

use axum::extract::{Path, Query, State};
use axum::Json;
use campus_core::cursor;
use campus_core::error::CoreError;
use campus_core::reminders::{Lookahead, DEFAULT_ON_DEMAND_LOOKAHEAD_MINS};
use campus_core::types::{DbId, Timestamp};
use campus_db::models::notification::Notification;
use campus_db::repositories::{NotificationRepo, UserRepo};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 20;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize, Validate)]
pub struct NotificationQuery {
    /// Opaque cursor from a previous page's `next_cursor`.
    pub cursor: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

/// Query parameters for `POST /notifications/check-schedule`.
#[derive(Debug, Deserialize)]
pub struct CheckScheduleQuery {
    pub lookahead_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    pub unread_count: i64,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
///
/// One page of the caller's notifications, newest first.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<NotificationPage>> {
    params.validate()?;

    let before = match params.cursor.as_deref().filter(|c| !c.is_empty()) {
        Some(raw) => Some(
            cursor::decode(raw).ok_or_else(|| AppError::BadRequest("bad cursor".into()))?,
        ),
        None => None,
    };
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    let page = load_page(&state, auth.user_id, before, limit).await?;
    Ok(Json(page))
}

/// POST /api/v1/notifications/{id}/read
///
/// 404 if the notification does not belong to the caller.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let found = NotificationRepo::mark_read(&state.pool, notification_id, auth.user_id).await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "marked_read": count,
    })))
}

/// POST /api/v1/notifications/check-schedule
///
/// Creates reminders for the caller's own upcoming lessons, then returns
/// the refreshed first page. Callers without a group get the page as is.
pub async fn check_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CheckScheduleQuery>,
) -> AppResult<Json<NotificationPage>> {
    let lookahead = Lookahead::from_minutes(
        params
            .lookahead_minutes
            .unwrap_or(DEFAULT_ON_DEMAND_LOOKAHEAD_MINS),
    )?;

    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "User",
                id: auth.user_id,
            })
        })?;

    if let Some(group_id) = user.group_id {
        state
            .reminders
            .check_for_user(user.id, group_id, Utc::now(), lookahead)
            .await?;
    }

    let page = load_page(&state, auth.user_id, None, DEFAULT_LIMIT).await?;
    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch `limit + 1` rows to learn whether another page exists.
async fn load_page(
    state: &AppState,
    user_id: DbId,
    before: Option<(Timestamp, DbId)>,
    limit: i64,
) -> Result<NotificationPage, sqlx::Error> {
    let mut items = NotificationRepo::list_page(&state.pool, user_id, before, limit + 1).await?;
    let has_more = items.len() as i64 > limit;
    items.truncate(limit as usize);

    let unread_count = NotificationRepo::unread_count(&state.pool, user_id).await?;

    let next_cursor = match items.last() {
        Some(last) if has_more => Some(cursor::encode(last.created_at, last.id)),
        _ => None,
    };

    Ok(NotificationPage {
        items,
        unread_count,
        has_more,
        next_cursor,
    })
}
