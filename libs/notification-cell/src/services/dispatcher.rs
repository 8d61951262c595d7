use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

use shared_database::{paths, RealtimeStore};
use shared_models::Doctor;

use crate::services::notifier::AcceptanceNotifier;
use crate::AcceptanceTemplate;

/// Runs acceptance notices as detached background tasks. Callers never wait
/// on them; the outcome is only visible in the log.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn AcceptanceNotifier>,
    store: Arc<dyn RealtimeStore>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn AcceptanceNotifier>, store: Arc<dyn RealtimeStore>) -> Self {
        Self { notifier, store }
    }

    /// Spawn the notice. Doctor details missing from `template` are looked up
    /// inside the task so the caller does not pay for the extra read.
    pub fn dispatch_acceptance(
        &self,
        doctor_id: &str,
        recipient: String,
        template: AcceptanceTemplate,
    ) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let store = Arc::clone(&self.store);
        let doctor_id = doctor_id.to_string();
        let span = info_span!("acceptance_notice", doctor_id = %doctor_id, serial = %template.serial_number);

        tokio::spawn(
            async move {
                let template = match store.read(&paths::doctor(&doctor_id)).await {
                    Ok(Some(value)) => match serde_json::from_value::<Doctor>(value) {
                        Ok(doctor) => template.with_doctor(&doctor),
                        Err(e) => {
                            warn!("Doctor profile {} is malformed: {}", doctor_id, e);
                            template
                        }
                    },
                    Ok(None) => template,
                    Err(e) => {
                        warn!("Could not load doctor profile {}: {}", doctor_id, e);
                        template
                    }
                };

                match notifier.notify_acceptance(&recipient, &template).await {
                    Ok(()) => info!("Acceptance notice delivered to {}", recipient),
                    Err(e) => error!("Failed to send acceptance notice to {}: {}", recipient, e),
                }
            }
            .instrument(span),
        )
    }
}
