use std::cmp::Reverse;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use shared_models::serde_helpers::string_or_number;

use crate::BookingError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Accepted | BookingStatus::Rejected)
    }

    pub fn can_transition_to(&self, target: &BookingStatus) -> bool {
        use BookingStatus::*;
        matches!((self, target), (Pending, Accepted) | (Pending, Rejected))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One appointment request, stored at `bookings/{doctorId}/{bookingId}`.
/// `id` and `doctorId` come from the key path, not from the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub doctor_id: String,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub age: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn from_record(doctor_id: &str, booking_id: &str, record: Value) -> Result<Self, serde_json::Error> {
        let mut booking: Booking = serde_json::from_value(record)?;
        booking.id = booking_id.to_string();
        booking.doctor_id = doctor_id.to_string();
        Ok(booking)
    }

    /// All bookings under a doctor's node, newest first. Children that are not
    /// booking records are skipped.
    pub fn list_from_snapshot(doctor_id: &str, snapshot: Option<&Value>) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = snapshot
            .and_then(Value::as_object)
            .map(|children| {
                children
                    .iter()
                    .filter_map(|(booking_id, record)| {
                        match Booking::from_record(doctor_id, booking_id, record.clone()) {
                            Ok(booking) => Some(booking),
                            Err(e) => {
                                warn!("Skipping malformed booking {}/{}: {}", doctor_id, booking_id, e);
                                None
                            }
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        sort_newest_first(&mut bookings);
        bookings
    }

    pub fn contact_email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|email| !email.is_empty())
    }

    pub fn with_acceptance(mut self, update: &AcceptanceUpdate) -> Self {
        self.status = update.status;
        self.serial_number = Some(update.serial_number);
        self.appointment_time = Some(update.appointment_time.clone());
        self.appointment_duration = Some(update.appointment_duration.clone());
        self.accepted_at = Some(update.accepted_at);
        self
    }

    pub fn with_rejection(mut self, update: &RejectionUpdate) -> Self {
        self.status = update.status;
        self.rejected_at = Some(update.rejected_at);
        self
    }
}

/// Newest `createdAt` first. Undated bookings follow the dated ones in
/// reverse id order; push ids are chronological, so that is newest first too.
pub fn sort_newest_first(bookings: &mut [Booking]) {
    // `None` orders below any timestamp, so reversing puts undated ones last.
    bookings.sort_by(|a, b| {
        (Reverse(a.created_at), Reverse(&a.id)).cmp(&(Reverse(b.created_at), Reverse(&b.id)))
    });
}

/// Fields written in the single partial update that accepts a booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceUpdate {
    pub status: BookingStatus,
    pub serial_number: u32,
    pub appointment_time: String,
    pub appointment_duration: String,
    pub accepted_at: DateTime<Utc>,
}

/// Fields written in the single partial update that rejects a booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionUpdate {
    pub status: BookingStatus,
    pub rejected_at: DateTime<Utc>,
}

pub fn into_fields<T: Serialize>(update: &T) -> Result<Map<String, Value>, BookingError> {
    match serde_json::to_value(update)? {
        Value::Object(fields) => Ok(fields),
        other => Err(BookingError::ValidationError(format!(
            "partial update must be an object, got {}",
            other
        ))),
    }
}

/// What a patient submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookingRequest {
    #[serde(default)]
    pub patient_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub age: String,
    #[serde(default)]
    pub reason: String,
}

/// Record pushed under `bookings/{doctorId}` for a new submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookingRecord {
    pub patient_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub age: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl NewBookingRecord {
    pub fn into_booking(self, doctor_id: &str, booking_id: &str) -> Booking {
        Booking {
            id: booking_id.to_string(),
            doctor_id: doctor_id.to_string(),
            patient_name: self.patient_name,
            phone: self.phone,
            email: self.email,
            age: self.age,
            reason: self.reason,
            doctor_name: self.doctor_name,
            status: self.status,
            serial_number: None,
            appointment_time: None,
            appointment_duration: None,
            created_at: Some(self.created_at),
            accepted_at: None,
            rejected_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_only_leaves_pending() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(&Accepted));
        assert!(Pending.can_transition_to(&Rejected));
        assert!(!Accepted.can_transition_to(&Rejected));
        assert!(!Rejected.can_transition_to(&Accepted));
        assert!(!Accepted.can_transition_to(&Pending));
        assert!(!Pending.can_transition_to(&Pending));
    }

    #[test]
    fn missing_status_means_pending() {
        let booking = Booking::from_record("doc1", "b1", json!({"patientName": "Karim", "phone": 8801700000000u64})).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.phone, "8801700000000");
        assert_eq!(booking.id, "b1");
        assert_eq!(booking.doctor_id, "doc1");
    }

    #[test]
    fn sorts_by_created_at_then_undated_by_id() {
        let snapshot = json!({
            "-a": {"patientName": "undated old"},
            "-c": {"patientName": "undated new"},
            "-x": {"patientName": "day one", "createdAt": "2024-01-01T10:00:00Z"},
            "-b": {"patientName": "day two", "createdAt": "2024-01-02T09:00:00.000Z"},
            "-z": {"status": "unknown"}
        });

        let names: Vec<String> = Booking::list_from_snapshot("doc1", Some(&snapshot))
            .into_iter()
            .map(|b| b.patient_name)
            .collect();

        assert_eq!(names, vec!["day two", "day one", "undated new", "undated old"]);
    }
}
