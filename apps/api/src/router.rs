use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use booking_cell::{create_booking_router, create_directory_router, BookingState, DoctorDirectoryService};

pub fn create_router(state: Arc<BookingState>, directory: Arc<DoctorDirectoryService>) -> Router {
    Router::new()
        .route("/", get(|| async { "Doctor booking API is running!" }))
        .merge(create_directory_router(directory))
        .nest("/doctors", create_booking_router(state))
}
