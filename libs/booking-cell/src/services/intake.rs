use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, instrument, warn};

use shared_database::{paths, RealtimeStore};
use shared_models::Doctor;
use shared_utils::Clock;

use crate::{Booking, BookingError, BookingStatus, NewBookingRecord, NewBookingRequest};

const MAX_EMAIL_LENGTH: usize = 254;

// Dot-separated domain labels, alphabetic TLD of two or more letters.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}$").expect("email pattern is valid")
});

// Stored without the leading plus; the SMS trigger adds it back.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6,15}$").expect("phone pattern is valid"));

static AGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{1,3}$").expect("age pattern is valid"));

/// The patient's side: turns a submitted form into a pending booking.
pub struct BookingIntakeService {
    store: Arc<dyn RealtimeStore>,
    clock: Arc<dyn Clock>,
}

impl BookingIntakeService {
    pub fn new(store: Arc<dyn RealtimeStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, request), fields(patient = %request.patient_name))]
    pub async fn submit(&self, doctor_id: &str, request: NewBookingRequest) -> Result<Booking, BookingError> {
        let request = validate_new_booking(request)?;

        let doctor = match self.store.read(&paths::doctor(doctor_id)).await? {
            Some(profile) => serde_json::from_value::<Doctor>(profile)
                .map_err(|e| warn!("Doctor profile {} is malformed: {}", doctor_id, e))
                .ok(),
            None => return Err(BookingError::DoctorNotFound(doctor_id.to_string())),
        };

        let record = NewBookingRecord {
            patient_name: request.patient_name,
            phone: request.phone,
            email: request.email,
            age: request.age,
            reason: request.reason,
            doctor_name: doctor.as_ref().and_then(Doctor::display_name).map(str::to_string),
            status: BookingStatus::Pending,
            created_at: self.clock.now(),
        };

        let booking_id = self
            .store
            .push(&paths::doctor_bookings(doctor_id), serde_json::to_value(&record)?)
            .await?;

        info!("New booking {} submitted for doctor {}", booking_id, doctor_id);
        Ok(record.into_booking(doctor_id, &booking_id))
    }
}

/// Trim the form and check it. Phone and age must be digits only; an empty
/// e-mail counts as none.
pub fn validate_new_booking(request: NewBookingRequest) -> Result<NewBookingRequest, BookingError> {
    let request = NewBookingRequest {
        patient_name: request.patient_name.trim().to_string(),
        phone: request.phone.trim().to_string(),
        email: request
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty()),
        age: request.age.trim().to_string(),
        reason: request.reason.trim().to_string(),
    };

    for (field, value) in [
        ("patientName", &request.patient_name),
        ("phone", &request.phone),
        ("age", &request.age),
        ("reason", &request.reason),
    ] {
        if value.is_empty() {
            return Err(BookingError::ValidationError(format!("{} is required", field)));
        }
    }

    if !PHONE_PATTERN.is_match(&request.phone) {
        return Err(BookingError::ValidationError("phone must be 6 to 15 digits".to_string()));
    }
    if !AGE_PATTERN.is_match(&request.age) {
        return Err(BookingError::ValidationError("age must be a whole number".to_string()));
    }

    if let Some(email) = &request.email {
        if !is_valid_email(email) {
            return Err(BookingError::ValidationError(format!("{} is not a valid e-mail address", email)));
        }
    }

    Ok(request)
}

fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH && EMAIL_PATTERN.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request() -> NewBookingRequest {
        NewBookingRequest {
            patient_name: "  Karim Uddin ".to_string(),
            phone: "8801700000000".to_string(),
            email: Some(" ".to_string()),
            age: "34".to_string(),
            reason: "Chest pain".to_string(),
        }
    }

    #[test]
    fn trims_fields_and_drops_blank_email() {
        let valid = validate_new_booking(request()).unwrap();
        assert_eq!(valid.patient_name, "Karim Uddin");
        assert_eq!(valid.email, None);
    }

    #[test]
    fn requires_every_field() {
        let mut missing_reason = request();
        missing_reason.reason = "   ".to_string();
        assert_matches!(
            validate_new_booking(missing_reason),
            Err(BookingError::ValidationError(message)) if message == "reason is required"
        );
    }

    #[test]
    fn phone_and_age_are_numeric() {
        let mut bad_phone = request();
        bad_phone.phone = "+880 1700".to_string();
        assert_matches!(validate_new_booking(bad_phone), Err(BookingError::ValidationError(_)));

        let mut bad_age = request();
        bad_age.age = "thirty".to_string();
        assert_matches!(validate_new_booking(bad_age), Err(BookingError::ValidationError(_)));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("karim@example.com"));
        assert!(is_valid_email("karim.uddin+clinic@mail.example.com.bd"));
        assert!(!is_valid_email("karim@example"));
        assert!(!is_valid_email("karim.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ka rim@example.com"));
        assert!(!is_valid_email("karim@example..com"));
        assert!(!is_valid_email("karim@example.c"));
        assert!(!is_valid_email("karim@.example.com"));
        assert!(!is_valid_email(&format!("{}@example.com", "k".repeat(250))));
    }

    #[test]
    fn rejects_malformed_email_in_submission() {
        for email in ["karim@example..com", "karim@example.c"] {
            assert_matches!(
                validate_new_booking(NewBookingRequest {
                    email: Some(email.to_string()),
                    ..request()
                }),
                Err(BookingError::ValidationError(_))
            );
        }
    }

    #[test]
    fn phone_and_age_lengths() {
        let mut short_phone = request();
        short_phone.phone = "123".to_string();
        assert_matches!(validate_new_booking(short_phone), Err(BookingError::ValidationError(_)));

        let mut old = request();
        old.age = "1234".to_string();
        assert_matches!(validate_new_booking(old), Err(BookingError::ValidationError(_)));
    }
}
