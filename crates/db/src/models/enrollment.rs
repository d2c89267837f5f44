//! Enrollment entity model and listing projection.

use convene_core::enrollment::EnrollmentStatus;
use convene_core::error::CoreError;
use convene_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `enrollments` table. At most one per (event, seeker).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: DbId,
    pub event_id: DbId,
    pub seeker_id: DbId,
    /// `ENROLLED` or `CANCELED`.
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Enrollment {
    /// Parse the stored status string.
    pub fn status(&self) -> Result<EnrollmentStatus, CoreError> {
        self.status.parse()
    }

    pub fn is_enrolled(&self) -> bool {
        matches!(self.status(), Ok(EnrollmentStatus::Enrolled))
    }
}

/// An enrollment joined with the event fields a seeker's list shows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EnrollmentListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub event_title: String,
    pub event_starts_at: Timestamp,
    pub event_ends_at: Timestamp,
}

/// An ENROLLED seeker whose reminder for the event has not gone out yet.
#[derive(Debug, Clone, FromRow)]
pub struct PendingReminder {
    /// The enrollment row that gets stamped once the reminder is accepted.
    pub enrollment_id: DbId,
    pub seeker_id: DbId,
    pub email: String,
}

/// Which slice of a seeker's enrollments to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentScope {
    All,
    /// Events that have not started yet, soonest first.
    Upcoming,
    /// Events that have already ended.
    Past,
}
