//! Route definitions for the `/push` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::push;
use crate::state::AppState;

/// Routes mounted at `/push`.
///
/// ```text
/// GET    /public-key    -> public_key (no auth)
/// POST   /subscribe     -> subscribe
/// POST   /unsubscribe   -> unsubscribe
/// POST   /test          -> send_test
/// POST   /broadcast     -> broadcast (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/public-key", get(push::public_key))
        .route("/subscribe", post(push::subscribe))
        .route("/unsubscribe", post(push::unsubscribe))
        .route("/test", post(push::send_test))
        .route("/broadcast", post(push::broadcast))
}
