use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;

use booking_cell::*;
use shared_database::{InMemoryStore, RealtimeStore};
use shared_utils::test_utils::{test_clock, test_now, BookingFixtures};

fn intake(store: &InMemoryStore) -> BookingIntakeService {
    BookingIntakeService::new(Arc::new(store.clone()), Arc::new(test_clock()))
}

fn request(email: Option<&str>) -> NewBookingRequest {
    NewBookingRequest {
        patient_name: "Karim Uddin".to_string(),
        phone: "8801700000000".to_string(),
        email: email.map(str::to_string),
        age: "34".to_string(),
        reason: "Chest pain".to_string(),
    }
}

#[tokio::test]
async fn test_submit_creates_pending_booking() {
    let store = BookingFixtures::store("doc1", "Ayesha Rahman", vec![]);

    let booking = intake(&store)
        .submit("doc1", request(Some("karim@example.com")))
        .await
        .unwrap();

    assert_eq!(booking.id.len(), 20);
    assert_eq!(booking.doctor_id, "doc1");
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.doctor_name.as_deref(), Some("Ayesha Rahman"));
    assert_eq!(booking.created_at, Some(test_now()));

    let stored = store
        .read(&format!("bookings/doc1/{}", booking.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["status"], "pending");
    assert_eq!(stored["patientName"], "Karim Uddin");
    assert_eq!(stored["doctorName"], "Ayesha Rahman");
    assert_eq!(stored["email"], "karim@example.com");
    assert!(stored.get("serialNumber").is_none());
}

#[tokio::test]
async fn test_submissions_keep_creation_order() {
    let store = BookingFixtures::store("doc1", "Ayesha Rahman", vec![]);
    let intake = intake(&store);

    let first = intake.submit("doc1", request(None)).await.unwrap();
    let second = intake.submit("doc1", request(None)).await.unwrap();

    assert!(first.id < second.id);
    let stored = store.read(&format!("bookings/doc1/{}", first.id)).await.unwrap().unwrap();
    assert!(stored.get("email").is_none());
}

#[tokio::test]
async fn test_submit_for_unknown_doctor() {
    let store = InMemoryStore::new();

    assert_matches!(
        intake(&store).submit("nobody", request(None)).await,
        Err(BookingError::DoctorNotFound(id)) if id == "nobody"
    );
    assert_eq!(store.dump().await, serde_json::Value::Null);
}

#[tokio::test]
async fn test_invalid_submission_writes_nothing() {
    let store = BookingFixtures::store("doc1", "Ayesha Rahman", vec![]);
    let before = store.dump().await;

    let mut bad = request(None);
    bad.age = "3a".to_string();
    assert_matches!(intake(&store).submit("doc1", bad).await, Err(BookingError::ValidationError(_)));

    assert_matches!(
        intake(&store).submit("doc1", request(Some("not-an-email"))).await,
        Err(BookingError::ValidationError(_))
    );
    assert_eq!(store.dump().await, before);
}

#[tokio::test]
async fn test_doctor_without_name_still_accepts_bookings() {
    let store = InMemoryStore::with_data(json!({"doctors": {"doc2": {"department": "ENT"}}}));

    let booking = intake(&store).submit("doc2", request(None)).await.unwrap();
    assert_eq!(booking.doctor_name, None);
}
