//! # Booking Cell
//!
//! Patients submit booking requests for a doctor; the doctor watches the
//! live list of requests and accepts or rejects each one exactly once.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                   Booking Cell                      |
//! +-----------------------------------------------------+
//! |  handlers.rs      |  HTTP endpoint handlers         |
//! |  router.rs        |  Route definitions              |
//! |  models.rs        |  Booking records & updates      |
//! |  services/        |                                 |
//! |    acceptance.rs  |  List / accept / reject         |
//! |    directory.rs   |  Doctors, departments, hospitals|
//! |    feed.rs        |  Live booking list              |
//! |    intake.rs      |  Patient submissions            |
//! |    lifecycle.rs   |  Status transition rules        |
//! |    numbering.rs   |  Serial number policies         |
//! |    schedule.rs    |  Appointment slot times         |
//! +-----------------------------------------------------+
//! ```
//!
//! ## Known limitation
//!
//! Serial numbers are derived from the accepting client's last-seen list of
//! bookings, not from a counter held by the store. Two clients accepting on
//! stale lists can hand out the same serial number. The computation lives
//! behind [`services::numbering::SerialNumberPolicy`] so a transactional
//! policy can replace it.

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::*;
pub use models::*;
pub use router::{create_booking_router, create_directory_router, BookingState};
pub use services::*;
