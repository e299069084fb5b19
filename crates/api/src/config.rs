use std::time::Duration;

use campus_core::reminders::{
    Lookahead, DEFAULT_DEDUP_WINDOW_MINS, DEFAULT_LOOKAHEAD_MINS, DEFAULT_POLL_INTERVAL,
};
use campus_events::delivery::web_push::DEFAULT_REQUEST_TIMEOUT;
use campus_events::dispatcher::DEFAULT_CONCURRENCY;

use crate::auth::jwt::JwtConfig;

/// Read an environment variable and parse it, falling back to `default`.
///
/// # Panics
///
/// Panics if the variable is set but does not parse.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight pushes (default: `10`).
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `10`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 10),
            jwt: JwtConfig::from_env(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReminderConfig
// ---------------------------------------------------------------------------

/// Reminder scheduler settings.
#[derive(Debug, Clone, Copy)]
pub struct ReminderConfig {
    pub poll_interval: Duration,
    pub lookahead: Lookahead,
    pub dedup_window: chrono::Duration,
}

impl ReminderConfig {
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `REMINDER_POLL_SECS`      | `30`    |
    /// | `REMINDER_LOOKAHEAD_MINS` | `6`     |
    /// | `REMINDER_DEDUP_MINS`     | `30`    |
    pub fn from_env() -> Self {
        let poll_secs: u64 = env_or("REMINDER_POLL_SECS", DEFAULT_POLL_INTERVAL.as_secs());
        assert!(poll_secs > 0, "REMINDER_POLL_SECS must be positive");

        let lookahead = Lookahead::from_minutes(env_or(
            "REMINDER_LOOKAHEAD_MINS",
            DEFAULT_LOOKAHEAD_MINS,
        ))
        .unwrap_or_else(|e| panic!("REMINDER_LOOKAHEAD_MINS: {e}"));

        let dedup_mins: i64 = env_or("REMINDER_DEDUP_MINS", DEFAULT_DEDUP_WINDOW_MINS);
        assert!(dedup_mins > 0, "REMINDER_DEDUP_MINS must be positive");

        Self {
            poll_interval: Duration::from_secs(poll_secs),
            lookahead,
            dedup_window: chrono::Duration::minutes(dedup_mins),
        }
    }
}

// ---------------------------------------------------------------------------
// PushConfig
// ---------------------------------------------------------------------------

/// Push dispatcher settings. VAPID keys are read separately by
/// `WebPushConfig::from_env`.
#[derive(Debug, Clone, Copy)]
pub struct PushConfig {
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub db_max_connections: u32,
}

impl PushConfig {
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `PUSH_CONCURRENCY`        | `16`    |
    /// | `PUSH_TIMEOUT_SECS`       | `5`     |
    /// | `PUSH_DB_MAX_CONNECTIONS` | `2`     |
    pub fn from_env() -> Self {
        Self {
            concurrency: env_or("PUSH_CONCURRENCY", DEFAULT_CONCURRENCY),
            request_timeout: Duration::from_secs(env_or(
                "PUSH_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT.as_secs(),
            )),
            db_max_connections: env_or("PUSH_DB_MAX_CONNECTIONS", 2),
        }
    }
}
