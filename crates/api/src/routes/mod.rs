pub mod health;
pub mod notification;
pub mod push;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /notifications                      list (cursor paginated)
/// /notifications/{id}/read            mark one read
/// /notifications/read-all             mark all read
/// /notifications/check-schedule       on-demand lesson reminders
///
/// /push/public-key                    VAPID public key (public)
/// /push/subscribe                     register a browser subscription
/// /push/unsubscribe                   deactivate a subscription
/// /push/test                          push to own subscriptions
/// /push/broadcast                     push to everyone (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/notifications", notification::router())
        .nest("/push", push::router())
}
