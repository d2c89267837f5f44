//! Delivery channels for scheduled notifications.

pub mod email;

use convene_core::notification::RenderedMessage;

use self::email::{EmailConfig, EmailDelivery, EmailError};

/// Where a due notification ends up.
pub enum Delivery {
    /// Send over SMTP.
    Email(EmailDelivery),
    /// Write the message to the log only. Used when SMTP is not configured.
    Log,
}

impl Delivery {
    /// Email delivery when `SMTP_HOST` is configured, log-only otherwise.
    pub fn from_env() -> Result<Self, EmailError> {
        match EmailConfig::from_env() {
            Some(config) => {
                tracing::info!(smtp_host = %config.smtp_host, "Email delivery configured");
                Ok(Delivery::Email(EmailDelivery::new(config)?))
            }
            None => {
                tracing::warn!("SMTP_HOST not set; notifications will be logged only");
                Ok(Delivery::Log)
            }
        }
    }

    pub async fn deliver(&self, recipient: &str, message: &RenderedMessage) -> Result<(), EmailError> {
        match self {
            Delivery::Email(email) => email.deliver(recipient, message).await,
            Delivery::Log => {
                tracing::info!(
                    to = recipient,
                    subject = %message.subject,
                    "Notification (log delivery)"
                );
                Ok(())
            }
        }
    }
}
