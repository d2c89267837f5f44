//! Event reminder sweep.
//!
//! [`ReminderSweep`] runs as a background task. Each tick it finds events
//! starting inside [`ReminderWindow::ahead_of`] the current time and
//! schedules an immediate reminder for every ENROLLED seeker who has not had
//! one yet. An enrollment is stamped `reminded_at` only after the scheduler
//! accepts its reminder, so refused reminders and seekers who enroll while
//! the event is already in the window are picked up by the next tick.

use std::sync::Arc;
use std::time::Duration;

use convene_core::clock::Clock;
use convene_core::notification::{NotificationScheduler, ScheduledNotification};
use convene_core::reminder::ReminderWindow;
use convene_core::types::Timestamp;
use convene_db::models::event::Event;
use convene_db::repositories::{EnrollmentRepo, EventRepo};
use convene_db::DbPool;
use tokio_util::sync::CancellationToken;

/// Default sweep cadence.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Longest cadence that still lands at least one tick inside every event's
/// ten-minute window.
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Events inside the window with seekers still to remind.
    pub events: usize,
    /// Reminders accepted by the scheduler.
    pub dispatched: usize,
    /// Reminders the scheduler refused. Retried next tick.
    pub failed: usize,
    /// Events skipped because their recipients could not be loaded.
    pub skipped_events: usize,
}

// ---------------------------------------------------------------------------
// ReminderSweep
// ---------------------------------------------------------------------------

pub struct ReminderSweep {
    pool: DbPool,
    scheduler: Arc<dyn NotificationScheduler>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl ReminderSweep {
    pub fn new(
        pool: DbPool,
        scheduler: Arc<dyn NotificationScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pool,
            scheduler,
            clock,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Override the sweep cadence. Clamped to `1s..=MAX_SWEEP_INTERVAL`.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the sweep loop until `cancel` fires.
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Reminder sweep started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder sweep cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!(error = %e, "Reminder sweep failed");
                    }
                }
            }
        }
    }

    /// One pass over the reminder window.
    ///
    /// Only the initial event query aborts the pass; a failure on one event
    /// is logged and the sweep moves on to the next.
    pub async fn sweep_once(&self) -> Result<SweepReport, sqlx::Error> {
        let now = self.clock.now();
        let window = ReminderWindow::ahead_of(now);
        let due = EventRepo::list_due_for_reminder(&self.pool, window.start, window.end).await?;

        let mut report = SweepReport {
            events: due.len(),
            ..Default::default()
        };

        for event in &due {
            match self.remind_event(event, now).await {
                Ok((dispatched, failed)) => {
                    report.dispatched += dispatched;
                    report.failed += failed;
                }
                Err(e) => {
                    report.skipped_events += 1;
                    tracing::error!(
                        event_id = event.id,
                        error = %e,
                        "Failed to load reminder recipients"
                    );
                }
            }
        }

        if report.events > 0 {
            tracing::info!(
                events = report.events,
                dispatched = report.dispatched,
                failed = report.failed,
                skipped_events = report.skipped_events,
                "Reminder sweep dispatched"
            );
        }

        Ok(report)
    }

    /// Schedule a reminder for every seeker on `event` still waiting for one.
    ///
    /// Each accepted reminder stamps its enrollment. A refusal is logged,
    /// counted, and left unstamped for the next tick.
    async fn remind_event(
        &self,
        event: &Event,
        now: Timestamp,
    ) -> Result<(usize, usize), sqlx::Error> {
        let pending = EnrollmentRepo::list_pending_reminders(&self.pool, event.id).await?;
        let mut dispatched = 0;
        let mut failed = 0;

        for recipient in pending {
            let notification =
                ScheduledNotification::event_reminder(recipient.email, event.id, &event.title);
            if let Err(e) = self.scheduler.schedule(notification).await {
                failed += 1;
                tracing::warn!(
                    event_id = event.id,
                    seeker_id = recipient.seeker_id,
                    error = %e,
                    "Failed to schedule event reminder"
                );
                continue;
            }

            dispatched += 1;
            // An unstamped row is reminded again next tick; delivery is
            // at-least-once.
            if let Err(e) =
                EnrollmentRepo::mark_reminded(&self.pool, recipient.enrollment_id, now).await
            {
                tracing::warn!(
                    event_id = event.id,
                    seeker_id = recipient.seeker_id,
                    error = %e,
                    "Failed to record event reminder"
                );
            }
        }

        Ok((dispatched, failed))
    }
}
