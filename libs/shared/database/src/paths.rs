//! Key paths of the booking tree.

pub const BOOKINGS_ROOT: &str = "bookings";
pub const DOCTORS_ROOT: &str = "doctors";

/// All bookings of one doctor.
pub fn doctor_bookings(doctor_id: &str) -> String {
    format!("{}/{}", BOOKINGS_ROOT, doctor_id)
}

pub fn booking(doctor_id: &str, booking_id: &str) -> String {
    format!("{}/{}/{}", BOOKINGS_ROOT, doctor_id, booking_id)
}

pub fn doctor(doctor_id: &str) -> String {
    format!("{}/{}", DOCTORS_ROOT, doctor_id)
}
