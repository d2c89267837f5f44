//! Convene notification infrastructure.
//!
//! - [`TokioScheduler`] -- the production [`NotificationScheduler`]: waits
//!   out each notification's delay on a tracked tokio task, then delivers.
//! - `RecordingScheduler` -- in-memory scheduler for tests, behind the
//!   `test-utils` feature.
//! - [`delivery`] -- delivery channels (SMTP email, log-only).
//! - [`ReminderSweep`] -- periodic job reminding enrolled seekers one hour
//!   before their event starts.
//!
//! [`NotificationScheduler`]: convene_core::notification::NotificationScheduler

pub mod delivery;
#[cfg(any(test, feature = "test-utils"))]
pub mod recording;
pub mod reminder;
pub mod scheduler;

pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::Delivery;
#[cfg(any(test, feature = "test-utils"))]
pub use recording::RecordingScheduler;
pub use reminder::{ReminderSweep, SweepReport};
pub use scheduler::TokioScheduler;
