//! Integration tests for lesson reminder generation and fan-out.

mod common;

use std::sync::Arc;

use campus_core::reminders::Lookahead;
use campus_db::models::notification::NotificationDraft;
use campus_db::repositories::NotificationRepo;
use campus_events::{NotificationFanout, PushDispatcher, ReminderGenerator};
use chrono::Duration;
use common::*;
use sqlx::PgPool;

fn generator(pool: &PgPool, dispatcher: Option<Arc<PushDispatcher>>) -> ReminderGenerator {
    ReminderGenerator::new(pool.clone(), NotificationFanout::new(pool.clone(), dispatcher))
}

// ---------------------------------------------------------------------------
// Reminder scenarios
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn algebra_reminder_reaches_every_group_member(pool: PgPool) {
    let group = seed_group(&pool, "G12").await;
    let u1 = seed_user(&pool, "u1@example.com", Some(group)).await;
    let u2 = seed_user(&pool, "u2@example.com", Some(group)).await;
    let now = nine_fifty_five();
    seed_lesson(&pool, group, "Algebra", now + Duration::minutes(5)).await;

    let created = generator(&pool, None)
        .generate_due_reminders(now, Lookahead::scheduler_default())
        .await
        .unwrap();

    assert_eq!(created, 2);
    for user in [u1, u2] {
        let rows = notifications_for(&pool, user).await;
        assert_eq!(
            rows,
            vec![(
                "Скоро пара: Algebra".to_string(),
                Some("lesson".to_string()),
                Some("/schedule".to_string())
            )]
        );
    }

    let page = NotificationRepo::list_page(&pool, u1, None, 1).await.unwrap();
    assert_eq!(
        page[0].body.as_deref(),
        Some("Лекция в 301, начало в 10:00")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inactive_member_gets_no_reminder(pool: PgPool) {
    let group = seed_group(&pool, "G12").await;
    let active = seed_user(&pool, "active@example.com", Some(group)).await;
    let inactive = seed_inactive_user(&pool, "gone@example.com", Some(group)).await;
    let now = nine_fifty_five();
    seed_lesson(&pool, group, "Algebra", now + Duration::minutes(5)).await;

    let created = generator(&pool, None)
        .generate_due_reminders(now, Lookahead::scheduler_default())
        .await
        .unwrap();

    assert_eq!(created, 1);
    assert_eq!(notifications_for(&pool, active).await.len(), 1);
    assert!(notifications_for(&pool, inactive).await.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn recently_notified_member_is_skipped(pool: PgPool) {
    let group = seed_group(&pool, "G12").await;
    let u1 = seed_user(&pool, "u1@example.com", Some(group)).await;
    let u2 = seed_user(&pool, "u2@example.com", Some(group)).await;
    let now = nine_fifty_five();
    seed_lesson(&pool, group, "Algebra", now + Duration::minutes(5)).await;

    let earlier = NotificationDraft {
        title: "Скоро пара: Algebra".to_string(),
        body: None,
        notification_type: Some("lesson".to_string()),
        url: Some("/schedule".to_string()),
    };
    NotificationFanout::new(pool.clone(), None)
        .fan_out_at(&earlier, &[u1], now - Duration::minutes(5))
        .await
        .unwrap();

    let created = generator(&pool, None)
        .generate_due_reminders(now, Lookahead::scheduler_default())
        .await
        .unwrap();

    assert_eq!(created, 1);
    assert_eq!(notifications_for(&pool, u1).await.len(), 1);
    assert_eq!(notifications_for(&pool, u2).await.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_generation_inside_window_notifies_once(pool: PgPool) {
    let group = seed_group(&pool, "G12").await;
    seed_user(&pool, "u1@example.com", Some(group)).await;
    seed_user(&pool, "u2@example.com", Some(group)).await;
    let now = nine_fifty_five();
    seed_lesson(&pool, group, "Algebra", now + Duration::minutes(5)).await;

    let generator = generator(&pool, None);
    let first = generator
        .generate_due_reminders(now, Lookahead::scheduler_default())
        .await
        .unwrap();
    let second = generator
        .generate_due_reminders(now + Duration::minutes(1), Lookahead::scheduler_default())
        .await
        .unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 0);
    assert_eq!(notification_count(&pool).await, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn lessons_outside_lookahead_are_ignored(pool: PgPool) {
    let group = seed_group(&pool, "G12").await;
    seed_user(&pool, "u1@example.com", Some(group)).await;
    let now = nine_fifty_five();
    seed_lesson(&pool, group, "Later", now + Duration::minutes(7)).await;
    seed_lesson(&pool, group, "Started", now - Duration::minutes(1)).await;

    let created = generator(&pool, None)
        .generate_due_reminders(now, Lookahead::scheduler_default())
        .await
        .unwrap();

    assert_eq!(created, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn group_without_members_creates_nothing(pool: PgPool) {
    let group = seed_group(&pool, "Empty").await;
    let now = nine_fifty_five();
    seed_lesson(&pool, group, "Algebra", now + Duration::minutes(5)).await;

    let created = generator(&pool, None)
        .generate_due_reminders(now, Lookahead::scheduler_default())
        .await
        .unwrap();

    assert_eq!(created, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn on_demand_check_reminds_only_the_caller(pool: PgPool) {
    let group = seed_group(&pool, "G12").await;
    let u1 = seed_user(&pool, "u1@example.com", Some(group)).await;
    let u2 = seed_user(&pool, "u2@example.com", Some(group)).await;
    let now = nine_fifty_five();
    seed_lesson(&pool, group, "Algebra", now + Duration::minutes(12)).await;

    let generator = generator(&pool, None);
    let lookahead = Lookahead::from_minutes(15).unwrap();
    let created = generator
        .check_for_user(u1, group, now, lookahead)
        .await
        .unwrap();
    assert_eq!(created, 1);
    assert!(notifications_for(&pool, u2).await.is_empty());

    // The scheduler later reaches the same lesson and skips u1.
    let later = now + Duration::minutes(7);
    let created = generator
        .generate_due_reminders(later, Lookahead::scheduler_default())
        .await
        .unwrap();
    assert_eq!(created, 1);
    assert_eq!(notifications_for(&pool, u1).await.len(), 1);
    assert_eq!(notifications_for(&pool, u2).await.len(), 1);
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn fan_out_deduplicates_recipients(pool: PgPool) {
    let a = seed_user(&pool, "a@example.com", None).await;
    let b = seed_user(&pool, "b@example.com", None).await;
    let draft = NotificationDraft {
        title: "Exam moved".to_string(),
        body: Some("Room 101".to_string()),
        notification_type: Some("test".to_string()),
        url: None,
    };

    let fanout = NotificationFanout::new(pool.clone(), None);
    assert_eq!(fanout.fan_out(&draft, &[a, b, a]).await.unwrap(), 2);
    assert_eq!(fanout.fan_out(&draft, &[]).await.unwrap(), 0);
    assert_eq!(notification_count(&pool).await, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fan_out_pushes_to_active_subscriptions_after_commit(pool: PgPool) {
    let a = seed_user(&pool, "a@example.com", None).await;
    let b = seed_user(&pool, "b@example.com", None).await;
    seed_subscription(&pool, a, "https://push.example/a").await;
    seed_subscription(&pool, b, "https://push.example/b").await;

    let transport = RecordingTransport::new();
    let dispatcher = Arc::new(PushDispatcher::new(transport.clone(), pool.clone(), 4));
    let fanout = NotificationFanout::new(pool.clone(), Some(Arc::clone(&dispatcher)));

    let draft = NotificationDraft {
        title: "Скоро пара: Algebra".to_string(),
        body: Some("Лекция в 301, начало в 10:00".to_string()),
        notification_type: Some("lesson".to_string()),
        url: Some("/schedule".to_string()),
    };
    let created = fanout.fan_out(&draft, &[a]).await.unwrap();
    dispatcher.wait_idle().await;

    assert_eq!(created, 1);
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let (target, message) = &sent[0];
    assert_eq!(target.endpoint, "https://push.example/a");
    assert_eq!(message.title, "Скоро пара: Algebra");
    assert_eq!(message.kind.as_deref(), Some("lesson"));
    assert_eq!(message.url.as_deref(), Some("/schedule"));
}
