use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};

use shared_config::{AppConfig, SerialNumbering};
use shared_database::InMemoryStore;

use crate::clock::FixedClock;

pub struct TestConfig {
    pub firebase_database_url: String,
    pub email_api_url: String,
    pub twilio_api_base_url: String,
    pub serial_numbering: SerialNumbering,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            firebase_database_url: String::new(),
            email_api_url: "http://localhost:9/email".to_string(),
            twilio_api_base_url: "http://localhost:9".to_string(),
            serial_numbering: SerialNumbering::Lifetime,
        }
    }
}

impl TestConfig {
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            firebase_database_url: uri.to_string(),
            email_api_url: format!("{}/api/v1.0/email/send", uri),
            twilio_api_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            firebase_database_url: self.firebase_database_url.clone(),
            serial_numbering: self.serial_numbering,
            email_api_url: self.email_api_url.clone(),
            email_service_id: "service_test".to_string(),
            email_template_id: "template_acceptance".to_string(),
            email_public_key: "public-test-key".to_string(),
            twilio_account_sid: "ACtest".to_string(),
            twilio_auth_token: "twilio-test-token".to_string(),
            twilio_from_number: "+15550000000".to_string(),
            twilio_api_base_url: self.twilio_api_base_url.clone(),
            ..AppConfig::default()
        }
    }
}

/// Noon UTC on 2024-01-02, the reference "today" of the fixtures.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
}

pub fn test_clock() -> FixedClock {
    FixedClock::new(test_now())
}

pub struct BookingFixtures;

impl BookingFixtures {
    pub fn doctor(name: &str) -> Value {
        json!({
            "name": name,
            "degree": "MBBS, FCPS",
            "department": "Cardiology",
            "hospital": "City General Hospital"
        })
    }

    pub fn pending(patient_name: &str, created_at: &str) -> Value {
        json!({
            "patientName": patient_name,
            "phone": "8801700000000",
            "age": "34",
            "reason": "Chest pain",
            "status": "pending",
            "createdAt": created_at
        })
    }

    pub fn pending_with_email(patient_name: &str, email: &str, created_at: &str) -> Value {
        let mut booking = Self::pending(patient_name, created_at);
        booking["email"] = json!(email);
        booking
    }

    pub fn accepted(patient_name: &str, serial_number: u32, created_at: &str, accepted_at: &str) -> Value {
        let mut booking = Self::pending(patient_name, created_at);
        booking["status"] = json!("accepted");
        booking["serialNumber"] = json!(serial_number);
        booking["appointmentTime"] = json!("9:00 AM");
        booking["appointmentDuration"] = json!("20 minutes");
        booking["acceptedAt"] = json!(accepted_at);
        booking
    }

    pub fn rejected(patient_name: &str, created_at: &str) -> Value {
        let mut booking = Self::pending(patient_name, created_at);
        booking["status"] = json!("rejected");
        booking["rejectedAt"] = json!(created_at);
        booking
    }

    /// Root document with one doctor and the given bookings keyed by id.
    pub fn tree(doctor_id: &str, doctor_name: &str, bookings: Vec<(&str, Value)>) -> Value {
        let bookings: Map<String, Value> = bookings
            .into_iter()
            .map(|(id, booking)| (id.to_string(), booking))
            .collect();
        json!({
            "doctors": { doctor_id: Self::doctor(doctor_name) },
            "bookings": { doctor_id: bookings }
        })
    }

    pub fn store(doctor_id: &str, doctor_name: &str, bookings: Vec<(&str, Value)>) -> InMemoryStore {
        InMemoryStore::with_data(Self::tree(doctor_id, doctor_name, bookings))
    }
}

pub struct MockFirebaseResponses;

impl MockFirebaseResponses {
    pub fn push_response(name: &str) -> Value {
        json!({ "name": name })
    }

    pub fn error_response(message: &str) -> Value {
        json!({ "error": message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_database::RealtimeStore;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_mock_server("http://127.0.0.1:4000").to_app_config();

        assert_eq!(config.firebase_database_url, "http://127.0.0.1:4000");
        assert!(config.is_email_configured());
        assert!(config.is_sms_configured());
    }

    #[test]
    fn test_accepted_fixture_has_derived_fields() {
        let booking = BookingFixtures::accepted("Rahim", 2, "2024-01-01T10:00:00Z", "2024-01-01T11:00:00Z");
        assert_eq!(booking["status"], "accepted");
        assert_eq!(booking["serialNumber"], 2);
    }

    #[tokio::test]
    async fn test_store_fixture_is_seeded() {
        let store = BookingFixtures::store(
            "doc1",
            "Ayesha Rahman",
            vec![("b1", BookingFixtures::pending("Karim", "2024-01-01T10:00:00Z"))],
        );
        let doctor = store.read("doctors/doc1/name").await.unwrap();
        assert_eq!(doctor, Some(json!("Ayesha Rahman")));
    }
}
