use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;

use crate::BookingStatus;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Booking {booking_id} has already been {status}")]
    AlreadyProcessed {
        booking_id: String,
        status: BookingStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<BookingError> for AppError {
    fn from(error: BookingError) -> Self {
        match error {
            BookingError::NotFound(id) => AppError::NotFound(format!("Booking {} does not exist", id)),
            BookingError::DoctorNotFound(id) => AppError::NotFound(format!("Doctor {} does not exist", id)),
            BookingError::AlreadyProcessed { booking_id, status } => AppError::Conflict(format!(
                "Booking {} was already {}; nothing was changed",
                booking_id, status
            )),
            BookingError::ValidationError(message) => AppError::ValidationError(message),
            BookingError::Store(e) => AppError::Database(format!("Failed to save booking changes: {}", e)),
            BookingError::SerializationError(e) => AppError::Internal(format!("Could not encode booking: {}", e)),
        }
    }
}
