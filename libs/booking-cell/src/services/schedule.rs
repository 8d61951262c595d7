use chrono::{Duration, NaiveTime};

pub const FIRST_SLOT_HOUR: u32 = 9;
pub const SLOT_MINUTES: u32 = 20;

const MINUTES_PER_DAY: u64 = 24 * 60;

/// Fixed-length appointment slots counted from the first slot of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSchedule {
    first_slot: NaiveTime,
    slot_minutes: u32,
}

impl Default for SlotSchedule {
    fn default() -> Self {
        Self {
            first_slot: NaiveTime::from_hms_opt(FIRST_SLOT_HOUR, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: SLOT_MINUTES,
        }
    }
}

impl SlotSchedule {
    /// Start of the slot for the patient holding `serial_number` (1-based).
    /// Wraps past midnight instead of failing.
    pub fn slot_start(&self, serial_number: u32) -> NaiveTime {
        // u32 * u32 always fits in u64; reducing to one day keeps the
        // duration in range.
        let elapsed = u64::from(serial_number.saturating_sub(1)) * u64::from(self.slot_minutes);
        let minutes_into_day = (elapsed % MINUTES_PER_DAY) as i64;
        let (time, _) = self.first_slot.overflowing_add_signed(Duration::minutes(minutes_into_day));
        time
    }

    /// `9:00 AM`, `10:20 AM`, `1:00 PM`: 12-hour clock, no leading zero.
    pub fn appointment_time(&self, serial_number: u32) -> String {
        format_12_hour(self.slot_start(serial_number))
    }

    pub fn duration_label(&self) -> String {
        format!("{} minutes", self.slot_minutes)
    }
}

pub fn format_12_hour(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_twenty_minutes_from_nine() {
        let schedule = SlotSchedule::default();
        assert_eq!(schedule.appointment_time(1), "9:00 AM");
        assert_eq!(schedule.appointment_time(3), "9:40 AM");
        assert_eq!(schedule.appointment_time(4), "10:00 AM");
        assert_eq!(schedule.appointment_time(7), "11:00 AM");
        assert_eq!(schedule.appointment_time(10), "12:00 PM");
        assert_eq!(schedule.appointment_time(14), "1:20 PM");
    }

    #[test]
    fn late_serials_wrap_past_midnight() {
        let schedule = SlotSchedule::default();
        // 9:00 + 45 * 20 min = 24:00
        assert_eq!(schedule.appointment_time(46), "12:00 AM");
        // 72 slots fill a whole day, so serial 73 lands back on 9:00.
        assert_eq!(schedule.appointment_time(73), "9:00 AM");
    }

    #[test]
    fn huge_serials_do_not_overflow() {
        let schedule = SlotSchedule::default();
        // (u32::MAX - 1) * 20 min is 760 min past a whole number of days
        assert_eq!(schedule.appointment_time(u32::MAX), "9:40 PM");
    }

    #[test]
    fn duration_label_matches_slot_length() {
        assert_eq!(SlotSchedule::default().duration_label(), "20 minutes");
    }
}
