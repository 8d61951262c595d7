use tracing::{debug, warn};

use crate::{Booking, BookingError, BookingStatus};

/// Transition rules for a booking: it leaves `pending` once and never again.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingLifecycleService;

impl BookingLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that `booking` may move to `target`.
    pub fn validate_status_transition(&self, booking: &Booking, target: &BookingStatus) -> Result<(), BookingError> {
        debug!("Validating status transition from {} to {}", booking.status, target);

        if booking.status.can_transition_to(target) {
            return Ok(());
        }

        warn!(
            "Rejected transition for booking {}: {} -> {}",
            booking.id, booking.status, target
        );

        if booking.status.is_terminal() {
            return Err(BookingError::AlreadyProcessed {
                booking_id: booking.id.clone(),
                status: booking.status,
            });
        }

        Err(BookingError::ValidationError(format!(
            "cannot move booking {} from {} to {}",
            booking.id, booking.status, target
        )))
    }

    pub fn get_valid_transitions(&self, current_status: &BookingStatus) -> Vec<BookingStatus> {
        match current_status {
            BookingStatus::Pending => vec![BookingStatus::Accepted, BookingStatus::Rejected],
            // Terminal states
            BookingStatus::Accepted | BookingStatus::Rejected => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn booking(status: &str) -> Booking {
        Booking::from_record("doc1", "b1", json!({"patientName": "Karim", "status": status})).unwrap()
    }

    #[test]
    fn pending_can_be_accepted_or_rejected() {
        let lifecycle = BookingLifecycleService::new();
        assert!(lifecycle.validate_status_transition(&booking("pending"), &BookingStatus::Accepted).is_ok());
        assert!(lifecycle.validate_status_transition(&booking("pending"), &BookingStatus::Rejected).is_ok());
    }

    #[test]
    fn processed_booking_is_reported_as_such() {
        let lifecycle = BookingLifecycleService::new();
        assert_matches!(
            lifecycle.validate_status_transition(&booking("accepted"), &BookingStatus::Rejected),
            Err(BookingError::AlreadyProcessed { status: BookingStatus::Accepted, .. })
        );
        assert_matches!(
            lifecycle.validate_status_transition(&booking("rejected"), &BookingStatus::Accepted),
            Err(BookingError::AlreadyProcessed { status: BookingStatus::Rejected, .. })
        );
    }

    #[test]
    fn pending_to_pending_is_invalid() {
        let lifecycle = BookingLifecycleService::new();
        assert_matches!(
            lifecycle.validate_status_transition(&booking("pending"), &BookingStatus::Pending),
            Err(BookingError::ValidationError(_))
        );
        assert!(lifecycle.get_valid_transitions(&BookingStatus::Accepted).is_empty());
    }
}
