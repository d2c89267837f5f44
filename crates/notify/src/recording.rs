//! A [`NotificationScheduler`] that records instead of sending.

use std::sync::Mutex;

use async_trait::async_trait;
use convene_core::notification::{NotificationScheduler, NotifyError, ScheduledNotification};

/// Keeps every scheduled notification in memory for later inspection.
///
/// With [`RecordingScheduler::failing`] every call returns
/// [`NotifyError::Unavailable`] and nothing is recorded.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    recorded: Mutex<Vec<ScheduledNotification>>,
    fail: bool,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            recorded: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Snapshot of everything scheduled so far, in call order.
    pub fn recorded(&self) -> Vec<ScheduledNotification> {
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[async_trait]
impl NotificationScheduler for RecordingScheduler {
    async fn schedule(&self, notification: ScheduledNotification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Unavailable("recording scheduler set to fail".into()));
        }
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
        Ok(())
    }
}
