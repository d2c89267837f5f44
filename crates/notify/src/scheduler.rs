//! In-process notification scheduler backed by tokio tasks.

use std::sync::Arc;

use async_trait::async_trait;
use convene_core::notification::{NotificationScheduler, NotifyError, ScheduledNotification};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::delivery::Delivery;

/// Sleeps out each notification's delay on its own tracked task, then
/// hands the rendered message to a [`Delivery`].
///
/// Pending notifications live in memory only: a process restart drops
/// anything not yet delivered.
pub struct TokioScheduler {
    delivery: Arc<Delivery>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl TokioScheduler {
    pub fn new(delivery: Delivery) -> Self {
        Self {
            delivery: Arc::new(delivery),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Number of notifications still waiting or in flight.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting work, abandon pending delays, and wait for in-flight
    /// deliveries to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.cancel.cancel();
        self.tracker.wait().await;
        tracing::info!("Notification scheduler stopped");
    }
}

#[async_trait]
impl NotificationScheduler for TokioScheduler {
    async fn schedule(&self, notification: ScheduledNotification) -> Result<(), NotifyError> {
        if self.tracker.is_closed() {
            return Err(NotifyError::Unavailable(
                "scheduler is shutting down".to_string(),
            ));
        }

        let delivery = Arc::clone(&self.delivery);
        let cancel = self.cancel.clone();

        tracing::debug!(
            to = %notification.recipient,
            template = notification.template.id(),
            delay_secs = notification.delay.as_secs(),
            "Notification scheduled"
        );

        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::warn!(
                        to = %notification.recipient,
                        template = notification.template.id(),
                        "Pending notification dropped on shutdown"
                    );
                    return;
                }
                _ = tokio::time::sleep(notification.delay) => {}
            }

            let message = notification.render();
            if let Err(e) = delivery.deliver(&notification.recipient, &message).await {
                tracing::error!(
                    to = %notification.recipient,
                    template = notification.template.id(),
                    error = %e,
                    "Failed to deliver notification"
                );
            }
        });

        Ok(())
    }
}
