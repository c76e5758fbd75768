//! Common time/period helpers for grip_core.

use chrono::{DateTime, Utc};

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;
/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Compute the period in microseconds for a given sampling rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Compute the period in milliseconds for a given sampling rate in Hz.
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    (MILLIS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Seconds from `a` to `b` as a float, floored at 0.
///
/// Microsecond resolution; spans too large for that fall back to milliseconds.
#[allow(clippy::cast_precision_loss)]
pub fn secs_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    let d = b - a;
    let secs = match d.num_microseconds() {
        Some(us) => us as f64 / MICROS_PER_SEC as f64,
        None => d.num_milliseconds() as f64 / MILLIS_PER_SEC as f64,
    };
    secs.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn secs_between_is_fractional_and_floored() {
        let a = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let b = a + Duration::milliseconds(1500);
        assert!((secs_between(a, b) - 1.5).abs() < 1e-12);
        assert_eq!(secs_between(b, a), 0.0);
    }
}
