use std::sync::Arc;

use campus_events::{PushDispatcher, ReminderGenerator};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Request/scheduler database pool.
    pub pool: campus_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Shared with the background scheduler for the on-demand trigger.
    pub reminders: Arc<ReminderGenerator>,
    /// `None` when Web Push is not configured.
    pub push: Option<Arc<PushDispatcher>>,
    /// VAPID application server key handed to browsers.
    pub vapid_public_key: Option<Arc<str>>,
}
