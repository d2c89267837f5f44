//! Integration tests for the reminder sweep against a real database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use convene_core::clock::FixedClock;
use convene_core::notification::{
    NotificationScheduler, NotificationTemplate, NotifyError, ScheduledNotification,
};
use convene_core::roles::Role;
use convene_core::types::{DbId, Timestamp};
use convene_db::models::event::{CreateEvent, UpdateEvent};
use convene_db::models::user::CreateUser;
use convene_db::repositories::{EnrollmentRepo, EventRepo, UserRepo};
use convene_notify::reminder::MAX_SWEEP_INTERVAL;
use convene_notify::{ReminderSweep, SweepReport};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, name: &str, role: Role) -> DbId {
    let input = CreateUser {
        username: name.to_string(),
        email: format!("{name}@test.com"),
        password_hash: "x".to_string(),
        role,
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

async fn new_event(pool: &PgPool, owner: DbId, title: &str, starts_at: Timestamp) -> DbId {
    let input = CreateEvent {
        title: title.to_string(),
        description: String::new(),
        language: "English".to_string(),
        location: "Online".to_string(),
        starts_at,
        ends_at: starts_at + Duration::hours(1),
        capacity: None,
    };
    EventRepo::create(pool, owner, &input).await.unwrap().id
}

async fn enroll(pool: &PgPool, event_id: DbId, seeker_id: DbId) {
    let mut tx = pool.begin().await.unwrap();
    EnrollmentRepo::upsert_enrolled(&mut *tx, event_id, seeker_id)
        .await
        .unwrap();
    tx.commit().await.unwrap();
}

fn sweep(pool: &PgPool, scheduler: Arc<dyn NotificationScheduler>, now: Timestamp) -> ReminderSweep {
    ReminderSweep::new(pool.clone(), scheduler, Arc::new(FixedClock::new(now)))
}

/// Records accepted notifications; refuses any addressed to `refuse`.
#[derive(Default)]
struct Recorder {
    refuse: Option<String>,
    accepted: Mutex<Vec<ScheduledNotification>>,
}

impl Recorder {
    fn refusing(recipient: &str) -> Self {
        Self {
            refuse: Some(recipient.to_string()),
            ..Default::default()
        }
    }

    fn recipients(&self) -> Vec<String> {
        self.accepted
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.recipient.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.accepted.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationScheduler for Recorder {
    async fn schedule(&self, notification: ScheduledNotification) -> Result<(), NotifyError> {
        if self.refuse.as_deref() == Some(notification.recipient.as_str()) {
            return Err(NotifyError::Rejected(notification.recipient));
        }
        self.accepted.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Accepts reminders, but renames `users.email` on the first one so every
/// later recipient query fails.
struct SchemaBreakingScheduler {
    pool: PgPool,
    accepted: Mutex<Vec<String>>,
}

#[async_trait]
impl NotificationScheduler for SchemaBreakingScheduler {
    async fn schedule(&self, notification: ScheduledNotification) -> Result<(), NotifyError> {
        let first = {
            let mut accepted = self.accepted.lock().unwrap();
            accepted.push(notification.recipient);
            accepted.len() == 1
        };
        if first {
            sqlx::query("ALTER TABLE users RENAME COLUMN email TO email_gone")
                .execute(&self.pool)
                .await
                .unwrap();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn reminds_enrolled_seeker_one_hour_ahead(pool: PgPool) {
    let now = Utc::now();
    let owner = new_user(&pool, "fac", Role::Facilitator).await;
    let seeker = new_user(&pool, "see", Role::Seeker).await;
    let soon = new_event(&pool, owner, "Soon", now + Duration::minutes(60)).await;
    let later = new_event(&pool, owner, "Later", now + Duration::minutes(120)).await;
    enroll(&pool, soon, seeker).await;
    enroll(&pool, later, seeker).await;

    let recorder = Arc::new(Recorder::default());
    let report = sweep(&pool, recorder.clone(), now).sweep_once().await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            events: 1,
            dispatched: 1,
            failed: 0,
            skipped_events: 0,
        }
    );
    let sent = recorder.accepted.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "see@test.com");
    assert_eq!(sent[0].template, NotificationTemplate::EventReminder);
    assert_eq!(sent[0].payload["event_id"], soon);
    assert_eq!(sent[0].render().subject, "Reminder: Soon starts in 1 hour!");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn canceled_seekers_are_not_reminded(pool: PgPool) {
    let now = Utc::now();
    let owner = new_user(&pool, "fac", Role::Facilitator).await;
    let stays = new_user(&pool, "stays", Role::Seeker).await;
    let leaves = new_user(&pool, "leaves", Role::Seeker).await;
    let event = new_event(&pool, owner, "Meetup", now + Duration::minutes(58)).await;
    enroll(&pool, event, stays).await;
    enroll(&pool, event, leaves).await;
    EnrollmentRepo::cancel(&pool, event, leaves).await.unwrap();

    let recorder = Arc::new(Recorder::default());
    sweep(&pool, recorder.clone(), now).sweep_once().await.unwrap();

    assert_eq!(recorder.recipients(), vec!["stays@test.com".to_string()]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_sweep_does_not_resend(pool: PgPool) {
    let now = Utc::now();
    let owner = new_user(&pool, "fac", Role::Facilitator).await;
    let seeker = new_user(&pool, "see", Role::Seeker).await;
    let event = new_event(&pool, owner, "Once", now + Duration::minutes(62)).await;
    enroll(&pool, event, seeker).await;

    let recorder = Arc::new(Recorder::default());
    sweep(&pool, recorder.clone(), now).sweep_once().await.unwrap();
    let report = sweep(&pool, recorder.clone(), now + Duration::minutes(5))
        .sweep_once()
        .await
        .unwrap();

    assert_eq!(report.events, 0);
    assert_eq!(recorder.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rescheduled_event_is_reminded_again(pool: PgPool) {
    let now = Utc::now();
    let owner = new_user(&pool, "fac", Role::Facilitator).await;
    let seeker = new_user(&pool, "see", Role::Seeker).await;
    let event = new_event(&pool, owner, "Moved", now + Duration::minutes(60)).await;
    enroll(&pool, event, seeker).await;

    let recorder = Arc::new(Recorder::default());
    sweep(&pool, recorder.clone(), now).sweep_once().await.unwrap();

    let new_start = now + Duration::days(1);
    let patch = UpdateEvent {
        starts_at: Some(new_start),
        ends_at: Some(new_start + Duration::hours(1)),
        ..Default::default()
    };
    EventRepo::update(&pool, event, &patch).await.unwrap();

    let later = new_start - Duration::minutes(60);
    sweep(&pool, recorder.clone(), later).sweep_once().await.unwrap();
    assert_eq!(recorder.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refused_reminder_is_retried_next_sweep(pool: PgPool) {
    let now = Utc::now();
    let owner = new_user(&pool, "fac", Role::Facilitator).await;
    let a = new_user(&pool, "a", Role::Seeker).await;
    let b = new_user(&pool, "b", Role::Seeker).await;
    let event = new_event(&pool, owner, "Resilient", now + Duration::minutes(62)).await;
    enroll(&pool, event, a).await;
    enroll(&pool, event, b).await;

    let refusing = Arc::new(Recorder::refusing("a@test.com"));
    let report = sweep(&pool, refusing.clone(), now).sweep_once().await.unwrap();
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(refusing.recipients(), vec!["b@test.com".to_string()]);

    // Only the refused seeker is still pending, and gets it on the next tick.
    let recorder = Arc::new(Recorder::default());
    let report = sweep(&pool, recorder.clone(), now + Duration::minutes(5))
        .sweep_once()
        .await
        .unwrap();
    assert_eq!(report.events, 1);
    assert_eq!(report.dispatched, 1);
    assert_eq!(recorder.recipients(), vec!["a@test.com".to_string()]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn seeker_enrolling_inside_window_is_reminded(pool: PgPool) {
    let now = Utc::now();
    let owner = new_user(&pool, "fac", Role::Facilitator).await;
    let early = new_user(&pool, "early", Role::Seeker).await;
    let late = new_user(&pool, "late", Role::Seeker).await;
    let event = new_event(&pool, owner, "Walk-in", now + Duration::minutes(64)).await;
    enroll(&pool, event, early).await;

    let recorder = Arc::new(Recorder::default());
    sweep(&pool, recorder.clone(), now).sweep_once().await.unwrap();

    enroll(&pool, event, late).await;
    let report = sweep(&pool, recorder.clone(), now + Duration::minutes(5))
        .sweep_once()
        .await
        .unwrap();

    assert_eq!(report.dispatched, 1);
    assert_eq!(
        recorder.recipients(),
        vec!["early@test.com".to_string(), "late@test.com".to_string()]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn event_with_no_seekers_yet_is_swept_once_they_enroll(pool: PgPool) {
    let now = Utc::now();
    let owner = new_user(&pool, "fac", Role::Facilitator).await;
    let seeker = new_user(&pool, "see", Role::Seeker).await;
    let event = new_event(&pool, owner, "Empty", now + Duration::minutes(64)).await;

    let recorder = Arc::new(Recorder::default());
    let report = sweep(&pool, recorder.clone(), now).sweep_once().await.unwrap();
    assert_eq!(report, SweepReport::default());

    enroll(&pool, event, seeker).await;
    let report = sweep(&pool, recorder.clone(), now + Duration::minutes(5))
        .sweep_once()
        .await
        .unwrap();

    assert_eq!(report.events, 1);
    assert_eq!(recorder.recipients(), vec!["see@test.com".to_string()]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn re_enrolling_after_reminder_does_not_resend(pool: PgPool) {
    let now = Utc::now();
    let owner = new_user(&pool, "fac", Role::Facilitator).await;
    let seeker = new_user(&pool, "see", Role::Seeker).await;
    let event = new_event(&pool, owner, "Fickle", now + Duration::minutes(60)).await;
    enroll(&pool, event, seeker).await;

    let recorder = Arc::new(Recorder::default());
    sweep(&pool, recorder.clone(), now).sweep_once().await.unwrap();
    EnrollmentRepo::cancel(&pool, event, seeker).await.unwrap();
    enroll(&pool, event, seeker).await;
    sweep(&pool, recorder.clone(), now + Duration::minutes(3))
        .sweep_once()
        .await
        .unwrap();

    assert_eq!(recorder.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn interval_is_kept_within_the_window(pool: PgPool) {
    let base = || sweep(&pool, Arc::new(Recorder::default()), Utc::now());

    assert_eq!(
        base().with_interval(std::time::Duration::ZERO).interval(),
        std::time::Duration::from_secs(1)
    );
    assert_eq!(
        base().with_interval(std::time::Duration::from_secs(3600)).interval(),
        MAX_SWEEP_INTERVAL
    );
    assert_eq!(
        base().with_interval(std::time::Duration::from_secs(120)).interval(),
        std::time::Duration::from_secs(120)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failing_event_is_skipped_and_sweep_continues(pool: PgPool) {
    let now = Utc::now();
    let owner = new_user(&pool, "fac", Role::Facilitator).await;
    let seeker = new_user(&pool, "see", Role::Seeker).await;
    let first = new_event(&pool, owner, "First", now + Duration::minutes(56)).await;
    let second = new_event(&pool, owner, "Second", now + Duration::minutes(60)).await;
    let third = new_event(&pool, owner, "Third", now + Duration::minutes(64)).await;
    for event in [first, second, third] {
        enroll(&pool, event, seeker).await;
    }

    let scheduler = Arc::new(SchemaBreakingScheduler {
        pool: pool.clone(),
        accepted: Mutex::new(Vec::new()),
    });
    let report = sweep(&pool, scheduler.clone(), now)
        .sweep_once()
        .await
        .expect("a failing event must not fail the whole sweep");

    assert_eq!(
        report,
        SweepReport {
            events: 3,
            dispatched: 1,
            failed: 0,
            skipped_events: 2,
        }
    );
    assert_eq!(scheduler.accepted.lock().unwrap().len(), 1);
}
