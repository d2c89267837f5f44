//! Enrollment engine.
//!
//! [`EnrollmentEngine::enroll`] runs the whole decision inside one
//! transaction that holds a row lock on the event, so concurrent enrolls on
//! the same event are serialized and the capacity check always sees the
//! committed count. Enrolls on different events lock different rows and do
//! not wait on each other.
//!
//! The follow-up notification is scheduled only after commit. A scheduling
//! failure is logged and never undoes the enrollment.

use std::sync::Arc;

use convene_core::enrollment::{decide_enroll, EnrollmentError};
use convene_core::error::CoreError;
use convene_core::notification::{NotificationScheduler, ScheduledNotification};
use convene_core::types::DbId;
use convene_db::models::enrollment::Enrollment;
use convene_db::repositories::{EnrollmentRepo, EventRepo};
use convene_db::DbPool;

use crate::error::{AppError, AppResult};

pub struct EnrollmentEngine {
    pool: DbPool,
    scheduler: Arc<dyn NotificationScheduler>,
}

impl EnrollmentEngine {
    pub fn new(pool: DbPool, scheduler: Arc<dyn NotificationScheduler>) -> Self {
        Self { pool, scheduler }
    }

    /// Enroll `seeker_id` in `event_id`.
    ///
    /// Creates the pair's row or flips a CANCELED row back to ENROLLED.
    /// Rejects with [`EnrollmentError::AlreadyEnrolled`] or
    /// [`EnrollmentError::EventFull`]; a missing event is `NotFound`.
    pub async fn enroll(
        &self,
        event_id: DbId,
        seeker_id: DbId,
        seeker_email: &str,
    ) -> AppResult<Enrollment> {
        let mut tx = self.pool.begin().await?;

        let event = EnrollmentRepo::lock_event(&mut *tx, event_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Event",
                id: event_id,
            }))?;

        let current = EnrollmentRepo::find_for_pair(&mut *tx, event_id, seeker_id)
            .await?
            .map(|row| row.status())
            .transpose()?;
        let others = EnrollmentRepo::count_enrolled_excluding(&mut *tx, event_id, seeker_id).await?;

        let transition = decide_enroll(current, event.capacity, others)?;
        let enrollment = EnrollmentRepo::upsert_enrolled(&mut *tx, event_id, seeker_id).await?;
        tx.commit().await?;

        tracing::info!(
            event_id,
            seeker_id,
            enrollment_id = enrollment.id,
            ?transition,
            "Seeker enrolled"
        );

        let followup =
            ScheduledNotification::enrollment_followup(seeker_email, event_id, &event.title);
        if let Err(e) = self.scheduler.schedule(followup).await {
            tracing::warn!(
                event_id,
                seeker_id,
                error = %e,
                "Failed to schedule enrollment follow-up"
            );
        }

        Ok(enrollment)
    }

    /// Cancel `seeker_id`'s enrollment in `event_id`.
    ///
    /// Only an ENROLLED pair can cancel; anything else is
    /// [`EnrollmentError::NotEnrolled`], or `NotFound` when the event does
    /// not exist. No notification is sent.
    pub async fn cancel(&self, event_id: DbId, seeker_id: DbId) -> AppResult<Enrollment> {
        if let Some(enrollment) = EnrollmentRepo::cancel(&self.pool, event_id, seeker_id).await? {
            tracing::info!(event_id, seeker_id, "Seeker canceled enrollment");
            return Ok(enrollment);
        }

        if EventRepo::find_by_id(&self.pool, event_id).await?.is_none() {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Event",
                id: event_id,
            }));
        }
        Err(EnrollmentError::NotEnrolled.into())
    }
}
