use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use campus_events::{
    NotificationFanout, PushDispatcher, PushTransport, ReminderGenerator, ReminderScheduler,
    SchedulerConfig, WebPushConfig, WebPushTransport,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_api::config::{PushConfig, ReminderConfig, ServerConfig};
use campus_api::router::build_app_router;
use campus_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campus_api=debug,campus_events=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let reminder_config = ReminderConfig::from_env();
    let push_config = PushConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = campus_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    campus_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    campus_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Web Push ---
    let web_push = WebPushConfig::from_env().expect("Invalid VAPID configuration");
    let (dispatcher, vapid_public_key) = match web_push {
        Some(web_push) => {
            let public_key: Arc<str> = Arc::from(web_push.public_key());
            let transport = WebPushTransport::new(web_push, push_config.request_timeout)
                .expect("Failed to build push HTTP client");

            let push_pool =
                campus_db::create_pool_with(&database_url, push_config.db_max_connections)
                    .await
                    .expect("Failed to connect push dispatcher pool");

            let transport: Arc<dyn PushTransport> = Arc::new(transport);
            let dispatcher = Arc::new(PushDispatcher::new(
                transport,
                push_pool,
                push_config.concurrency,
            ));
            tracing::info!(concurrency = push_config.concurrency, "Web Push enabled");
            (Some(dispatcher), Some(public_key))
        }
        None => {
            tracing::warn!("VAPID keys not set, Web Push disabled");
            (None, None)
        }
    };

    // --- Reminders ---
    let fanout = NotificationFanout::new(pool.clone(), dispatcher.clone());
    let reminders = Arc::new(
        ReminderGenerator::new(pool.clone(), fanout)
            .with_dedup_window(reminder_config.dedup_window),
    );
    let scheduler = ReminderScheduler::new(
        Arc::clone(&reminders),
        SchedulerConfig {
            poll_interval: reminder_config.poll_interval,
            lookahead: reminder_config.lookahead,
        },
    );
    let scheduler_handle = scheduler.start().await;

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        reminders,
        push: dispatcher.clone(),
        vapid_public_key,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    scheduler_handle.stop().await;

    if let Some(dispatcher) = dispatcher {
        dispatcher
            .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
            .await;
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM (on Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
