#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use campus_core::schedule::WeekParity;
use campus_core::types::{DbId, Timestamp};
use campus_db::models::group::CreateGroup;
use campus_db::models::schedule::CreateScheduleEntry;
use campus_db::models::user::CreateUser;
use campus_db::repositories::{GroupRepo, ScheduleRepo, UserRepo};
use campus_events::{
    DeliveryOutcome, NotificationFanout, PushDispatcher, PushMessage, PushTarget, PushTransport,
    ReminderGenerator,
};
use chrono::Duration;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use campus_api::auth::jwt::{generate_access_token, JwtConfig};
use campus_api::config::ServerConfig;
use campus_api::router::build_app_router;
use campus_api::state::AppState;

pub const TEST_PUBLIC_KEY: &str = "BTestPublicKey";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Application with push disabled.
pub fn build_test_app(pool: PgPool) -> Router {
    build(pool, None)
}

/// Application whose pushes go to a [`RecordingTransport`].
pub fn build_test_app_with_push(
    pool: PgPool,
) -> (Router, Arc<PushDispatcher>, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new();
    let dispatcher = Arc::new(PushDispatcher::new(
        Arc::clone(&transport) as Arc<dyn PushTransport>,
        pool.clone(),
        4,
    ));
    let app = build(pool, Some(Arc::clone(&dispatcher)));
    (app, dispatcher, transport)
}

fn build(pool: PgPool, push: Option<Arc<PushDispatcher>>) -> Router {
    let config = test_config();
    let fanout = NotificationFanout::new(pool.clone(), push.clone());
    let reminders = Arc::new(ReminderGenerator::new(pool.clone(), fanout));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        reminders,
        vapid_public_key: push.as_ref().map(|_| Arc::from(TEST_PUBLIC_KEY)),
        push,
    };
    build_app_router(state, &config)
}

/// Bearer token for a user with the given role.
pub fn token_for(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_group(pool: &PgPool, name: &str) -> DbId {
    GroupRepo::create(
        pool,
        &CreateGroup {
            name: name.to_string(),
            course: None,
            faculty: None,
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn seed_user(pool: &PgPool, email: &str, role: &str, group_id: Option<DbId>) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            full_name: None,
            role: Some(role.to_string()),
            group_id,
            is_active: None,
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn seed_lesson(pool: &PgPool, group_id: DbId, subject: &str, start: Timestamp) -> DbId {
    ScheduleRepo::create(
        pool,
        &CreateScheduleEntry {
            group_id,
            subject: subject.to_string(),
            teacher: None,
            room: Some("301".to_string()),
            weekday: "monday".to_string(),
            start_time: start,
            end_time: start + Duration::minutes(90),
            parity: WeekParity::Both,
            lesson_type: Some("Лекция".to_string()),
        },
    )
    .await
    .unwrap()
    .id
}

/// Insert a notification with an explicit `created_at`.
pub async fn seed_notification(
    pool: &PgPool,
    user_id: DbId,
    title: &str,
    created_at: Timestamp,
) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO notifications (user_id, title, created_at) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(title)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the decoded JSON body.
pub async fn expect_json(response: Response, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Push transport
// ---------------------------------------------------------------------------

/// Transport that records every send and reports it delivered.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(PushTarget, PushMessage)>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(PushTarget, PushMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send(&self, target: &PushTarget, message: &PushMessage) -> DeliveryOutcome {
        self.sent
            .lock()
            .unwrap()
            .push((target.clone(), message.clone()));
        DeliveryOutcome::Delivered
    }
}
