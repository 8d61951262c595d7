use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::services::notifier::AcceptanceNotifier;
use crate::{AcceptanceTemplate, NotificationError};

/// Client for an EmailJS-compatible "send templated e-mail" endpoint.
#[derive(Debug)]
pub struct EmailNotifier {
    client: Client,
    api_url: String,
    service_id: String,
    template_id: String,
    public_key: String,
}

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    to_email: &'a str,
    #[serde(flatten)]
    template: &'a AcceptanceTemplate,
}

impl EmailNotifier {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_email_configured() {
            return Err(NotificationError::NotConfigured(
                "EMAIL_SERVICE_ID, EMAIL_TEMPLATE_ID and EMAIL_PUBLIC_KEY are required".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_url: config.email_api_url.clone(),
            service_id: config.email_service_id.clone(),
            template_id: config.email_template_id.clone(),
            public_key: config.email_public_key.clone(),
        })
    }
}

#[async_trait]
impl AcceptanceNotifier for EmailNotifier {
    async fn notify_acceptance(
        &self,
        recipient: &str,
        template: &AcceptanceTemplate,
    ) -> Result<(), NotificationError> {
        if recipient.trim().is_empty() {
            return Err(NotificationError::MissingRecipient(template.serial_number.clone()));
        }

        let request = EmailRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.public_key,
            template_params: TemplateParams {
                to_email: recipient,
                template,
            },
        };

        debug!("Sending acceptance e-mail request to: {}", self.api_url);

        let response = self.client.post(&self.api_url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("E-mail API error ({}): {}", status, body);
            return Err(NotificationError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        info!("Acceptance e-mail sent to {}", recipient);
        Ok(())
    }
}
