use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::NotificationError;

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotificationError>;
}

/// Twilio Programmable Messaging client.
/// POST {base}/2010-04-01/Accounts/{AccountSid}/Messages.json
pub struct TwilioSmsGateway {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSmsGateway {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_sms_configured() {
            return Err(NotificationError::NotConfigured(
                "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_FROM_NUMBER are required".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.twilio_api_base_url.trim_end_matches('/').to_string(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_from_number.clone(),
        })
    }
}

#[async_trait]
impl SmsGateway for TwilioSmsGateway {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotificationError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        debug!("Sending SMS request to: {}", url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("SMS gateway error ({}): {}", status, body);
            return Err(NotificationError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        info!("SMS sent to {}", to);
        Ok(())
    }
}
