//! Event entity model, listing projection, and DTOs.

use convene_core::enrollment::available_seats;
use convene_core::types::{DbId, Timestamp};
use convene_core::validation::{MAX_LANGUAGE_LEN, MAX_TITLE_LEN};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub language: String,
    pub location: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    /// `None` means unlimited.
    pub capacity: Option<i32>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An event joined with its owner's email and enrollment counts, as seen by
/// one viewer.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub created_by_email: String,
    /// Number of ENROLLED rows on this event.
    pub enrolled_count: i64,
    /// Whether the viewer currently holds an ENROLLED row.
    pub is_enrolled: bool,
}

impl EventListing {
    /// `capacity - enrolled_count`, or `None` for unlimited events.
    pub fn available_seats(&self) -> Option<i64> {
        available_seats(self.event.capacity, self.enrolled_count)
    }
}

/// Columns the lock query needs to decide an enrollment.
#[derive(Debug, Clone, FromRow)]
pub struct LockedEvent {
    pub id: DbId,
    pub title: String,
    pub capacity: Option<i32>,
}

/// DTO for creating an event. The owner comes from the caller identity.
///
/// `starts_at < ends_at` is checked separately with
/// [`validate_schedule`](convene_core::validation::validate_schedule).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEvent {
    #[validate(length(min = 1, max = MAX_TITLE_LEN))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = MAX_LANGUAGE_LEN))]
    pub language: String,
    #[validate(length(min = 1, max = MAX_TITLE_LEN))]
    pub location: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
}

/// DTO for updating an event. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEvent {
    #[validate(length(min = 1, max = MAX_TITLE_LEN))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = MAX_LANGUAGE_LEN))]
    pub language: Option<String>,
    #[validate(length(min = 1, max = MAX_TITLE_LEN))]
    pub location: Option<String>,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
}

/// Optional filters for event listing (`?location=&language=&starts_after=&starts_before=&q=`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub location: Option<String>,
    pub language: Option<String>,
    pub starts_after: Option<Timestamp>,
    pub starts_before: Option<Timestamp>,
    /// Case-insensitive substring match on title or description.
    pub q: Option<String>,
}
