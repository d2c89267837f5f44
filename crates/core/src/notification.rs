//! Notification templates and the scheduler contract.
//!
//! The enrollment engine and the reminder sweep describe *what* to send as a
//! [`ScheduledNotification`] and hand it to a [`NotificationScheduler`].
//! Scheduling is fire-and-forget: implementations enqueue and return, and
//! delivery is at-least-once. Callers treat a scheduling error as
//! non-fatal.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Template id for the post-enrollment follow-up.
pub const TEMPLATE_ENROLLMENT_FOLLOWUP: &str = "enrollment_followup";

/// Template id for the one-hour-before reminder.
pub const TEMPLATE_EVENT_REMINDER: &str = "event_reminder";

/// Which message to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    EnrollmentFollowup,
    EventReminder,
}

/// Subject and plain-text body ready for a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

impl NotificationTemplate {
    pub fn id(self) -> &'static str {
        match self {
            NotificationTemplate::EnrollmentFollowup => TEMPLATE_ENROLLMENT_FOLLOWUP,
            NotificationTemplate::EventReminder => TEMPLATE_EVENT_REMINDER,
        }
    }

    pub fn render(self, event_title: &str) -> RenderedMessage {
        match self {
            NotificationTemplate::EnrollmentFollowup => RenderedMessage {
                subject: format!("Thanks for enrolling in {event_title}"),
                body: "We hope you are excited! This is a follow-up 1 hour after your enrollment."
                    .to_string(),
            },
            NotificationTemplate::EventReminder => RenderedMessage {
                subject: format!("Reminder: {event_title} starts in 1 hour!"),
                body: format!("Get ready, your event {event_title} is starting soon."),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ScheduledNotification
// ---------------------------------------------------------------------------

/// A message to deliver to one recipient after `delay`.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledNotification {
    /// Recipient address (an email address today).
    pub recipient: String,
    pub template: NotificationTemplate,
    /// Template data. Always carries `event_id` and `event_title`.
    pub payload: serde_json::Value,
    #[serde(skip)]
    pub delay: Duration,
}

impl ScheduledNotification {
    /// Follow-up sent [`FOLLOWUP_DELAY`](crate::enrollment::FOLLOWUP_DELAY)
    /// after a successful enroll.
    pub fn enrollment_followup(
        recipient: impl Into<String>,
        event_id: DbId,
        event_title: &str,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            template: NotificationTemplate::EnrollmentFollowup,
            payload: serde_json::json!({ "event_id": event_id, "event_title": event_title }),
            delay: crate::enrollment::FOLLOWUP_DELAY,
        }
    }

    /// Reminder dispatched immediately by the sweep.
    pub fn event_reminder(recipient: impl Into<String>, event_id: DbId, event_title: &str) -> Self {
        Self {
            recipient: recipient.into(),
            template: NotificationTemplate::EventReminder,
            payload: serde_json::json!({ "event_id": event_id, "event_title": event_title }),
            delay: Duration::ZERO,
        }
    }

    /// The `event_title` carried in the payload, or an empty string.
    pub fn event_title(&self) -> &str {
        self.payload
            .get("event_title")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }

    pub fn render(&self) -> RenderedMessage {
        self.template.render(self.event_title())
    }
}

// ---------------------------------------------------------------------------
// Scheduler contract
// ---------------------------------------------------------------------------

/// Why a notification could not be enqueued.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The scheduler refused this notification (bad address, etc.).
    #[error("Notification rejected: {0}")]
    Rejected(String),

    /// The scheduler cannot accept work right now (shutting down, etc.).
    #[error("Notification scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Accepts "send message M to recipient R after delay D".
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    async fn schedule(&self, notification: ScheduledNotification) -> Result<(), NotifyError>;
}
