//! Time and timestamp helpers, plus the simulated clock arithmetic.
//!
//! The simulated clock is an absolute minute counted from the start of the
//! run. Everything that depends on the time of day works on
//! [`minute_of_day`], which wraps every [`MINUTES_PER_DAY`].

use chrono::{DateTime, Utc};

/// UTC timestamp used for journal record times.
pub type Timestamp = DateTime<Utc>;

/// Number of simulated minutes in a day.
pub const MINUTES_PER_DAY: u32 = 1440;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Minute-of-day in `[0, 1439]` for an absolute simulated minute.
#[must_use]
pub fn minute_of_day(minute: u32) -> u32 {
    minute % MINUTES_PER_DAY
}

/// Hour of day in `[0, 23]` for an absolute simulated minute.
#[must_use]
pub fn hour_of_day(minute: u32) -> u32 {
    minute_of_day(minute) / 60
}

/// Render an absolute simulated minute as `HH:MM`.
#[must_use]
pub fn format_clock(minute: u32) -> String {
    let of_day = minute_of_day(minute);
    format!("{:02}:{:02}", of_day / 60, of_day % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_wrap_minute_of_day_after_midnight() {
        assert_eq!(minute_of_day(0), 0);
        assert_eq!(minute_of_day(1439), 1439);
        assert_eq!(minute_of_day(1440), 0);
        assert_eq!(minute_of_day(1500), 60);
    }

    #[test]
    fn should_derive_hour_from_minute() {
        assert_eq!(hour_of_day(59), 0);
        assert_eq!(hour_of_day(60), 1);
        assert_eq!(hour_of_day(1439), 23);
    }

    #[test]
    fn should_format_clock_with_zero_padding() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(7 * 60 + 5), "07:05");
        assert_eq!(format_clock(MINUTES_PER_DAY + 90), "01:30");
    }
}
