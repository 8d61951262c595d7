use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};

use shared_config::SerialNumbering;

use crate::{Booking, BookingStatus};

/// Picks the serial number for the next accepted booking.
///
/// Implementations only see the caller's snapshot; they do not coordinate
/// with the store. Two callers working from the same stale snapshot get the
/// same number.
pub trait SerialNumberPolicy: Send + Sync {
    fn next_serial(&self, snapshot: &[Booking], today: NaiveDate) -> u32;

    fn name(&self) -> &'static str;
}

/// Counts every accepted booking the doctor has.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifetimeCount;

impl SerialNumberPolicy for LifetimeCount {
    fn next_serial(&self, snapshot: &[Booking], _today: NaiveDate) -> u32 {
        let accepted = snapshot
            .iter()
            .filter(|booking| booking.status == BookingStatus::Accepted)
            .count();
        u32::try_from(accepted).unwrap_or(u32::MAX - 1) + 1
    }

    fn name(&self) -> &'static str {
        "lifetime"
    }
}

/// Counts bookings accepted on the current clinic day, so numbering restarts
/// at 1 every day.
///
/// A booking is dated by `acceptedAt`, or by `createdAt` when that is
/// missing, in the clinic's offset. Pending and rejected bookings never
/// count. This differs from the mobile app's daily count, which took every
/// booking *created* on the current UTC day whatever its status, so a day
/// with rejections there skipped serial numbers.
#[derive(Debug, Clone, Copy)]
pub struct DailyCount {
    clinic_offset: FixedOffset,
}

impl DailyCount {
    pub fn new(clinic_offset: FixedOffset) -> Self {
        Self { clinic_offset }
    }
}

impl SerialNumberPolicy for DailyCount {
    fn next_serial(&self, snapshot: &[Booking], today: NaiveDate) -> u32 {
        let accepted_today = snapshot
            .iter()
            .filter(|booking| booking.status == BookingStatus::Accepted)
            .filter(|booking| {
                booking
                    .accepted_at
                    .or(booking.created_at)
                    .map(|at| at.with_timezone(&self.clinic_offset).date_naive() == today)
                    .unwrap_or(false)
            })
            .count();
        u32::try_from(accepted_today).unwrap_or(u32::MAX - 1) + 1
    }

    fn name(&self) -> &'static str {
        "daily"
    }
}

pub fn policy_for(numbering: SerialNumbering, clinic_offset: FixedOffset) -> Arc<dyn SerialNumberPolicy> {
    match numbering {
        SerialNumbering::Lifetime => Arc::new(LifetimeCount),
        SerialNumbering::Daily => Arc::new(DailyCount::new(clinic_offset)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn booking(record: serde_json::Value) -> Booking {
        Booking::from_record("doc1", "b", record).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lifetime_counts_all_accepted() {
        let snapshot = vec![
            booking(json!({"status": "accepted", "acceptedAt": "2023-05-01T09:00:00Z"})),
            booking(json!({"status": "accepted", "acceptedAt": "2024-01-02T09:00:00Z"})),
            booking(json!({"status": "rejected"})),
            booking(json!({"status": "pending"})),
        ];
        assert_eq!(LifetimeCount.next_serial(&snapshot, day(2024, 1, 2)), 3);
        assert_eq!(LifetimeCount.next_serial(&[], day(2024, 1, 2)), 1);
    }

    #[test]
    fn daily_counts_only_today_in_clinic_time() {
        // UTC+6: 2024-01-01T20:00Z is already 2024-01-02 at the clinic.
        let policy = DailyCount::new(FixedOffset::east_opt(6 * 3600).unwrap());
        let snapshot = vec![
            booking(json!({"status": "accepted", "acceptedAt": "2024-01-01T20:00:00Z"})),
            booking(json!({"status": "accepted", "acceptedAt": "2024-01-01T10:00:00Z"})),
            booking(json!({"status": "accepted", "createdAt": "2024-01-02T03:00:00Z"})),
            booking(json!({"status": "pending", "createdAt": "2024-01-02T03:00:00Z"})),
        ];
        assert_eq!(policy.next_serial(&snapshot, day(2024, 1, 2)), 3);
    }

    #[test]
    fn daily_dates_by_acceptance_not_creation() {
        let policy = DailyCount::new(FixedOffset::east_opt(0).unwrap());
        let snapshot = vec![
            // Created yesterday, accepted today.
            booking(json!({"status": "accepted", "createdAt": "2024-01-01T16:00:00Z", "acceptedAt": "2024-01-02T08:00:00Z"})),
            // Created today but rejected.
            booking(json!({"status": "rejected", "createdAt": "2024-01-02T07:00:00Z"})),
            booking(json!({"status": "rejected", "createdAt": "2024-01-02T07:30:00Z"})),
        ];
        assert_eq!(policy.next_serial(&snapshot, day(2024, 1, 2)), 2);
    }
}
