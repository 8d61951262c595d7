use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use shared_config::AppConfig;

use crate::services::email::EmailNotifier;
use crate::{AcceptanceTemplate, NotificationError};

/// Sends the "your booking was accepted" message to a patient.
#[async_trait]
pub trait AcceptanceNotifier: Send + Sync {
    async fn notify_acceptance(
        &self,
        recipient: &str,
        template: &AcceptanceTemplate,
    ) -> Result<(), NotificationError>;
}

/// Local simulation: the message is only written to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl AcceptanceNotifier for LogNotifier {
    async fn notify_acceptance(
        &self,
        recipient: &str,
        template: &AcceptanceTemplate,
    ) -> Result<(), NotificationError> {
        if recipient.trim().is_empty() {
            return Err(NotificationError::MissingRecipient(template.serial_number.clone()));
        }
        info!("Acceptance notice for {}: {}", recipient, template.summary());
        Ok(())
    }
}

/// E-mail when the e-mail API is configured, log-only otherwise.
pub fn notifier_from_config(config: &AppConfig) -> Arc<dyn AcceptanceNotifier> {
    match EmailNotifier::new(config) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            warn!("{} - falling back to logged notices", e);
            Arc::new(LogNotifier)
        }
    }
}
