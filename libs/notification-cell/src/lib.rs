//! # Notification Cell
//!
//! Best-effort messages sent to patients when a doctor accepts a booking.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                Notification Cell                    |
//! +-----------------------------------------------------+
//! |  models.rs        |  Templates & booking views      |
//! |  services/        |                                 |
//! |    notifier.rs    |  AcceptanceNotifier trait, log  |
//! |    email.rs       |  E-mail API notifier            |
//! |    dispatcher.rs  |  Detached notification tasks    |
//! |    sms.rs         |  SMS gateway (Twilio)           |
//! |    trigger.rs     |  Store-driven SMS trigger       |
//! +-----------------------------------------------------+
//! ```
//!
//! Two independent paths exist: the client-side notifier dispatched by the
//! booking service right after an accept, and the SMS trigger which watches
//! the booking tree and reacts to any `status` change to `accepted`.

pub mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
