use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_EMAIL_API_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";
pub const DEFAULT_TWILIO_API_BASE_URL: &str = "https://api.twilio.com";

/// How serial numbers are counted when a booking is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialNumbering {
    /// Every accepted booking the doctor has ever had.
    #[default]
    Lifetime,
    /// Only bookings accepted on the current clinic day.
    Daily,
}

impl FromStr for SerialNumbering {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lifetime" => Ok(SerialNumbering::Lifetime),
            "daily" => Ok(SerialNumbering::Daily),
            other => Err(format!("unknown serial numbering policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub firebase_database_url: String,
    pub firebase_auth_token: String,
    pub serial_numbering: SerialNumbering,
    pub clinic_utc_offset_minutes: i32,
    pub email_api_url: String,
    pub email_service_id: String,
    pub email_template_id: String,
    pub email_public_key: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,
    pub twilio_api_base_url: String,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            firebase_database_url: String::new(),
            firebase_auth_token: String::new(),
            serial_numbering: SerialNumbering::default(),
            clinic_utc_offset_minutes: 0,
            email_api_url: DEFAULT_EMAIL_API_URL.to_string(),
            email_service_id: String::new(),
            email_template_id: String::new(),
            email_public_key: String::new(),
            twilio_account_sid: String::new(),
            twilio_auth_token: String::new(),
            twilio_from_number: String::new(),
            twilio_api_base_url: DEFAULT_TWILIO_API_BASE_URL.to_string(),
            server_port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            firebase_database_url: env::var("FIREBASE_DATABASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("FIREBASE_DATABASE_URL not set, bookings will be kept in memory");
                    String::new()
                }),
            firebase_auth_token: env::var("FIREBASE_AUTH_TOKEN").unwrap_or_default(),
            serial_numbering: env::var("SERIAL_NUMBERING")
                .ok()
                .and_then(|value| {
                    value
                        .parse()
                        .map_err(|e| warn!("{}, falling back to lifetime numbering", e))
                        .ok()
                })
                .unwrap_or(defaults.serial_numbering),
            clinic_utc_offset_minutes: env::var("CLINIC_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|value| {
                    value
                        .parse()
                        .map_err(|_| warn!("CLINIC_UTC_OFFSET_MINUTES is not a number, using UTC"))
                        .ok()
                })
                .unwrap_or(defaults.clinic_utc_offset_minutes),
            email_api_url: env::var("EMAIL_API_URL").unwrap_or(defaults.email_api_url),
            email_service_id: env::var("EMAIL_SERVICE_ID").unwrap_or_default(),
            email_template_id: env::var("EMAIL_TEMPLATE_ID").unwrap_or_default(),
            email_public_key: env::var("EMAIL_PUBLIC_KEY").unwrap_or_default(),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_from_number: env::var("TWILIO_FROM_NUMBER").unwrap_or_default(),
            twilio_api_base_url: env::var("TWILIO_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.twilio_api_base_url),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.server_port),
        };

        if !config.is_email_configured() {
            warn!("E-mail service not configured - acceptance notices will only be logged");
        }

        config
    }

    pub fn is_firebase_configured(&self) -> bool {
        !self.firebase_database_url.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.email_api_url.is_empty()
            && !self.email_service_id.is_empty()
            && !self.email_template_id.is_empty()
            && !self.email_public_key.is_empty()
    }

    pub fn is_sms_configured(&self) -> bool {
        !self.twilio_account_sid.is_empty()
            && !self.twilio_auth_token.is_empty()
            && !self.twilio_from_number.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbering_policy_case_insensitively() {
        assert_eq!("Daily".parse::<SerialNumbering>(), Ok(SerialNumbering::Daily));
        assert_eq!(" lifetime ".parse::<SerialNumbering>(), Ok(SerialNumbering::Lifetime));
        assert!("weekly".parse::<SerialNumbering>().is_err());
    }

    #[test]
    fn default_config_is_unconfigured() {
        let config = AppConfig::default();
        assert!(!config.is_firebase_configured());
        assert!(!config.is_email_configured());
        assert!(!config.is_sms_configured());
        assert_eq!(config.server_port, 3000);
    }
}
