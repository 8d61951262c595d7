pub mod doctor;
pub mod error;
pub mod serde_helpers;

pub use doctor::Doctor;
pub use error::AppError;
