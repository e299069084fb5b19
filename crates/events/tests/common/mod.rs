#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use campus_core::schedule::WeekParity;
use campus_core::types::{DbId, Timestamp};
use campus_db::models::group::CreateGroup;
use campus_db::models::push_subscription::UpsertPushSubscription;
use campus_db::models::schedule::CreateScheduleEntry;
use campus_db::models::user::CreateUser;
use campus_db::repositories::{GroupRepo, PushSubscriptionRepo, ScheduleRepo, UserRepo};
use campus_events::{DeliveryOutcome, PushMessage, PushTarget, PushTransport};
use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;

/// Transport that records every send and answers from a script keyed by
/// endpoint (default: delivered). Endpoints marked with `panic_on` panic
/// after being recorded.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(PushTarget, PushMessage)>>,
    outcomes: Mutex<HashMap<String, DeliveryOutcome>>,
    panics: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, endpoint: &str, outcome: DeliveryOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), outcome);
    }

    pub fn panic_on(&self, endpoint: &str) {
        self.panics.lock().unwrap().insert(endpoint.to_string());
    }

    pub fn sent(&self) -> Vec<(PushTarget, PushMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<String> =
            self.sent().into_iter().map(|(t, _)| t.endpoint).collect();
        endpoints.sort();
        endpoints
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send(&self, target: &PushTarget, message: &PushMessage) -> DeliveryOutcome {
        self.sent
            .lock()
            .unwrap()
            .push((target.clone(), message.clone()));
        let panics = self.panics.lock().unwrap().contains(&target.endpoint);
        if panics {
            panic!("transport blew up for {}", target.endpoint);
        }
        self.outcomes
            .lock()
            .unwrap()
            .get(&target.endpoint)
            .cloned()
            .unwrap_or(DeliveryOutcome::Delivered)
    }
}

/// 2024-09-02 09:55 UTC.
pub fn nine_fifty_five() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 9, 2, 9, 55, 0).unwrap()
}

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

pub async fn seed_user(pool: &PgPool, email: &str, group_id: Option<DbId>) -> DbId {
    create_user(pool, email, group_id, None).await
}

pub async fn seed_inactive_user(pool: &PgPool, email: &str, group_id: Option<DbId>) -> DbId {
    create_user(pool, email, group_id, Some(false)).await
}

async fn create_user(
    pool: &PgPool,
    email: &str,
    group_id: Option<DbId>,
    is_active: Option<bool>,
) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            full_name: None,
            role: None,
            group_id,
            is_active,
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

pub async fn seed_subscription(pool: &PgPool, user_id: DbId, endpoint: &str) -> DbId {
    PushSubscriptionRepo::upsert(
        pool,
        &UpsertPushSubscription {
            endpoint: endpoint.to_string(),
            p256dh: "p256dh".to_string(),
            auth: "auth".to_string(),
            user_id,
        },
    )
    .await
    .unwrap()
    .id
}

/// Rows in `notifications` for a user, as `(title, type, url)`.
pub async fn notifications_for(
    pool: &PgPool,
    user_id: DbId,
) -> Vec<(String, Option<String>, Option<String>)> {
    sqlx::query_as(
        "SELECT title, notification_type, url FROM notifications WHERE user_id = $1 ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

pub async fn notification_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
        .fetch_one(pool)
        .await
        .unwrap()
}
