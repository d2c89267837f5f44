//! Enrollment state machine and capacity arithmetic.
//!
//! A (event, seeker) pair is in one of three states: `ABSENT` (no row yet),
//! `ENROLLED`, or `CANCELED`. Both stored states are revisitable:
//!
//! ```text
//! ABSENT   --enroll-->  ENROLLED   (capacity permitting)
//! CANCELED --enroll-->  ENROLLED   (capacity permitting, same row)
//! ENROLLED --cancel-->  CANCELED
//! ```
//!
//! Every other request is rejected with an [`EnrollmentError`]. The functions
//! here only decide; the caller must evaluate them inside the per-event
//! critical section so the capacity count they see is current.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Delay before the "thanks for enrolling" follow-up is delivered.
pub const FOLLOWUP_DELAY: Duration = Duration::from_secs(3600);

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Stored value for [`EnrollmentStatus::Enrolled`].
pub const STATUS_ENROLLED: &str = "ENROLLED";
/// Stored value for [`EnrollmentStatus::Canceled`].
pub const STATUS_CANCELED: &str = "CANCELED";

/// Persisted state of an enrollment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Enrolled,
    Canceled,
}

impl EnrollmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => STATUS_ENROLLED,
            EnrollmentStatus::Canceled => STATUS_CANCELED,
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_ENROLLED => Ok(EnrollmentStatus::Enrolled),
            STATUS_CANCELED => Ok(EnrollmentStatus::Canceled),
            other => Err(CoreError::Internal(format!(
                "Unknown enrollment status: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A rejected enrollment transition.
///
/// These are normal outcomes reported back to the seeker, never defects.
/// The messages are relied on by clients: they contain "already enrolled",
/// "full", and "not enrolled" respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentError {
    #[error("You are already enrolled in this event.")]
    AlreadyEnrolled,

    #[error("You are not enrolled in this event.")]
    NotEnrolled,

    #[error("Event is full.")]
    EventFull,
}

impl EnrollmentError {
    /// Machine-readable code for API responses.
    pub fn code(self) -> &'static str {
        match self {
            EnrollmentError::AlreadyEnrolled => "ALREADY_ENROLLED",
            EnrollmentError::NotEnrolled => "NOT_ENROLLED",
            EnrollmentError::EventFull => "EVENT_FULL",
        }
    }
}

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

/// Whether one more seeker fits. `None` capacity means unlimited.
pub fn has_capacity(capacity: Option<i32>, enrolled_count: i64) -> bool {
    match capacity {
        None => true,
        Some(cap) => enrolled_count < i64::from(cap),
    }
}

/// Remaining seats, or `None` when the event has no cap.
pub fn available_seats(capacity: Option<i32>, enrolled_count: i64) -> Option<i64> {
    capacity.map(|cap| i64::from(cap) - enrolled_count)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// The write an accepted enroll request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollTransition {
    /// `ABSENT -> ENROLLED`: insert a new row.
    Create,
    /// `CANCELED -> ENROLLED`: flip the existing row back.
    Reactivate,
}

/// Decide an enroll request.
///
/// `current` is the pair's stored status (`None` when no row exists) and
/// `enrolled_others` the number of ENROLLED rows on the event excluding
/// this pair.
pub fn decide_enroll(
    current: Option<EnrollmentStatus>,
    capacity: Option<i32>,
    enrolled_others: i64,
) -> Result<EnrollTransition, EnrollmentError> {
    let transition = match current {
        Some(EnrollmentStatus::Enrolled) => return Err(EnrollmentError::AlreadyEnrolled),
        Some(EnrollmentStatus::Canceled) => EnrollTransition::Reactivate,
        None => EnrollTransition::Create,
    };

    if !has_capacity(capacity, enrolled_others) {
        return Err(EnrollmentError::EventFull);
    }

    Ok(transition)
}

/// Decide a cancel request. Only an ENROLLED pair can cancel.
pub fn decide_cancel(current: Option<EnrollmentStatus>) -> Result<(), EnrollmentError> {
    match current {
        Some(EnrollmentStatus::Enrolled) => Ok(()),
        Some(EnrollmentStatus::Canceled) | None => Err(EnrollmentError::NotEnrolled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Capacity
    // -----------------------------------------------------------------------

    #[test]
    fn unlimited_capacity_always_fits() {
        assert!(has_capacity(None, 0));
        assert!(has_capacity(None, 1_000_000));
        assert_eq!(available_seats(None, 42), None);
    }

    #[test]
    fn capacity_is_a_hard_cap() {
        assert!(has_capacity(Some(2), 1));
        assert!(!has_capacity(Some(2), 2));
        assert!(!has_capacity(Some(2), 3));
    }

    #[test]
    fn zero_capacity_never_fits() {
        assert!(!has_capacity(Some(0), 0));
        assert_eq!(available_seats(Some(0), 0), Some(0));
    }

    #[test]
    fn available_seats_is_capacity_minus_enrolled() {
        assert_eq!(available_seats(Some(10), 3), Some(7));
        assert_eq!(available_seats(Some(1), 1), Some(0));
    }

    // -----------------------------------------------------------------------
    // Enroll
    // -----------------------------------------------------------------------

    #[test]
    fn first_enroll_creates_row() {
        assert_eq!(
            decide_enroll(None, Some(1), 0),
            Ok(EnrollTransition::Create)
        );
    }

    #[test]
    fn re_enroll_after_cancel_reactivates() {
        assert_eq!(
            decide_enroll(Some(EnrollmentStatus::Canceled), None, 5),
            Ok(EnrollTransition::Reactivate)
        );
    }

    #[test]
    fn enroll_while_enrolled_is_rejected() {
        assert_eq!(
            decide_enroll(Some(EnrollmentStatus::Enrolled), None, 0),
            Err(EnrollmentError::AlreadyEnrolled)
        );
    }

    #[test]
    fn already_enrolled_wins_over_full() {
        // A full event reports the more specific rejection.
        assert_eq!(
            decide_enroll(Some(EnrollmentStatus::Enrolled), Some(1), 1),
            Err(EnrollmentError::AlreadyEnrolled)
        );
    }

    #[test]
    fn enroll_into_full_event_is_rejected() {
        assert_eq!(
            decide_enroll(None, Some(1), 1),
            Err(EnrollmentError::EventFull)
        );
        assert_eq!(
            decide_enroll(Some(EnrollmentStatus::Canceled), Some(3), 3),
            Err(EnrollmentError::EventFull)
        );
    }

    // -----------------------------------------------------------------------
    // Cancel
    // -----------------------------------------------------------------------

    #[test]
    fn cancel_requires_active_enrollment() {
        assert_eq!(decide_cancel(Some(EnrollmentStatus::Enrolled)), Ok(()));
        assert_eq!(decide_cancel(None), Err(EnrollmentError::NotEnrolled));
        assert_eq!(
            decide_cancel(Some(EnrollmentStatus::Canceled)),
            Err(EnrollmentError::NotEnrolled)
        );
    }

    // -----------------------------------------------------------------------
    // Status / messages
    // -----------------------------------------------------------------------

    #[test]
    fn status_parses_stored_values() {
        assert_eq!(
            "ENROLLED".parse::<EnrollmentStatus>().unwrap(),
            EnrollmentStatus::Enrolled
        );
        assert_eq!(
            "CANCELED".parse::<EnrollmentStatus>().unwrap(),
            EnrollmentStatus::Canceled
        );
        assert!("enrolled".parse::<EnrollmentStatus>().is_err());
    }

    #[test]
    fn error_messages_carry_client_keywords() {
        assert!(EnrollmentError::AlreadyEnrolled
            .to_string()
            .contains("already enrolled"));
        assert!(EnrollmentError::EventFull.to_string().contains("full"));
        assert!(EnrollmentError::NotEnrolled
            .to_string()
            .contains("not enrolled"));
    }

    #[test]
    fn followup_is_one_hour_out() {
        assert_eq!(FOLLOWUP_DELAY.as_secs(), 3600);
    }
}
