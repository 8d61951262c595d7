use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::{stream, Stream};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use shared_models::error::AppError;

use crate::{BookingState, DoctorDirectoryService, NewBookingRequest};

/// Current bookings for a doctor, newest first
pub async fn list_bookings(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let bookings = state.acceptance.refresh(&doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "doctor_id": doctor_id,
        "total": bookings.len(),
        "bookings": bookings
    })))
}

/// Server-sent events: one `bookings` event per snapshot of the list
pub async fn stream_bookings(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let feed = state.acceptance.list_for_doctor(&doctor_id).await?;
    info!("Live booking stream opened for doctor {}", doctor_id);

    let events = stream::unfold(feed, |mut feed| async move {
        let event = match feed.next().await? {
            Ok(bookings) => Event::default()
                .event("bookings")
                .json_data(&bookings)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
            Err(e) => Event::default().event("error").data(e.to_string()),
        };
        Some((Ok(event), feed))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Patient submits a new booking request
pub async fn submit_booking(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<String>,
    Json(request): Json<NewBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking = state.intake.submit(&doctor_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "booking": booking,
            "message": "Booking request sent"
        })),
    ))
}

pub async fn get_booking(
    State(state): State<Arc<BookingState>>,
    Path((doctor_id, booking_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let booking = state.acceptance.get(&doctor_id, &booking_id).await?;

    Ok(Json(json!({
        "success": true,
        "booking": booking
    })))
}

/// Accept a pending booking; the list is re-read first since HTTP callers
/// hold no live view
pub async fn accept_booking(
    State(state): State<Arc<BookingState>>,
    Path((doctor_id, booking_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    state.acceptance.refresh(&doctor_id).await?;
    let booking = state.acceptance.accept(&doctor_id, &booking_id).await?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": format!(
            "Booking accepted as serial {} at {}",
            booking.serial_number.unwrap_or_default(),
            booking.appointment_time.as_deref().unwrap_or_default()
        )
    })))
}

pub async fn reject_booking(
    State(state): State<Arc<BookingState>>,
    Path((doctor_id, booking_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    state.acceptance.refresh(&doctor_id).await?;
    let booking = state.acceptance.reject(&doctor_id, &booking_id).await?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": "Booking rejected"
    })))
}

pub async fn delete_booking(
    State(state): State<Arc<BookingState>>,
    Path((doctor_id, booking_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    state.acceptance.delete(&doctor_id, &booking_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Booking deleted"
    })))
}

#[derive(Debug, Deserialize)]
pub struct HospitalSearchQuery {
    pub search: Option<String>,
}

pub async fn list_doctors(
    State(directory): State<Arc<DoctorDirectoryService>>,
) -> Result<Json<Value>, AppError> {
    let doctors = directory.list_doctors().await?;

    Ok(Json(json!({
        "success": true,
        "total": doctors.len(),
        "doctors": doctors
    })))
}

pub async fn get_doctor(
    State(directory): State<Arc<DoctorDirectoryService>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = directory.get_doctor(&doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

pub async fn list_departments(
    State(directory): State<Arc<DoctorDirectoryService>>,
) -> Result<Json<Value>, AppError> {
    let departments = directory.departments().await?;

    Ok(Json(json!({
        "success": true,
        "total": departments.len(),
        "departments": departments
    })))
}

pub async fn list_doctors_in_department(
    State(directory): State<Arc<DoctorDirectoryService>>,
    Path(department): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctors = directory.doctors_in_department(&department).await?;

    Ok(Json(json!({
        "success": true,
        "department": department,
        "total": doctors.len(),
        "doctors": doctors
    })))
}

/// Hospitals, optionally narrowed by `?search=`
pub async fn list_hospitals(
    State(directory): State<Arc<DoctorDirectoryService>>,
    Query(query): Query<HospitalSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let hospitals = directory.hospitals(query.search.as_deref()).await?;

    Ok(Json(json!({
        "success": true,
        "total": hospitals.len(),
        "hospitals": hospitals
    })))
}

pub async fn list_doctors_in_hospital(
    State(directory): State<Arc<DoctorDirectoryService>>,
    Path(hospital): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctors = directory.doctors_in_hospital(&hospital).await?;

    Ok(Json(json!({
        "success": true,
        "hospital": hospital,
        "total": doctors.len(),
        "doctors": doctors
    })))
}
