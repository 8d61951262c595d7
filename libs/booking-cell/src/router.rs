use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_database::RealtimeStore;
use shared_utils::SystemClock;
use notification_cell::NotificationDispatcher;

use crate::handlers::{
    accept_booking, delete_booking, get_booking, get_doctor, list_bookings, list_departments, list_doctors,
    list_doctors_in_department, list_doctors_in_hospital, list_hospitals, reject_booking, stream_bookings,
    submit_booking,
};
use crate::services::{
    acceptance::BookingAcceptanceService, directory::DoctorDirectoryService, intake::BookingIntakeService,
};

pub struct BookingState {
    pub acceptance: Arc<BookingAcceptanceService>,
    pub intake: Arc<BookingIntakeService>,
}

impl BookingState {
    pub fn new(acceptance: BookingAcceptanceService, intake: BookingIntakeService) -> Self {
        Self {
            acceptance: Arc::new(acceptance),
            intake: Arc::new(intake),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn RealtimeStore>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self::new(
            BookingAcceptanceService::from_config(config, Arc::clone(&store), notifications),
            BookingIntakeService::new(store, Arc::new(SystemClock)),
        )
    }
}

pub fn create_booking_router(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/{doctor_id}/bookings", get(list_bookings).post(submit_booking))
        .route("/{doctor_id}/bookings/live", get(stream_bookings))
        .route("/{doctor_id}/bookings/{booking_id}", get(get_booking).delete(delete_booking))
        .route("/{doctor_id}/bookings/{booking_id}/accept", post(accept_booking))
        .route("/{doctor_id}/bookings/{booking_id}/reject", post(reject_booking))
        .with_state(state)
}

/// Public browsing routes, mounted at the root next to the booking routes.
pub fn create_directory_router(directory: Arc<DoctorDirectoryService>) -> Router {
    Router::new()
        .route("/doctors", get(list_doctors))
        .route("/doctors/{doctor_id}", get(get_doctor))
        .route("/departments", get(list_departments))
        .route("/departments/{department}/doctors", get(list_doctors_in_department))
        .route("/hospitals", get(list_hospitals))
        .route("/hospitals/{hospital}/doctors", get(list_doctors_in_hospital))
        .with_state(directory)
}
