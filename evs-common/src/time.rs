//! Timestamp and wall-clock utilities

use chrono::Utc;
use std::time::Duration;

/// Current wall-clock time as Unix milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Convert fractional seconds to duration
///
/// Negatives and NaN clamp to zero; values too large for a `Duration`
/// saturate at `Duration::MAX`.
pub fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

/// Source of wall-clock time in Unix milliseconds
///
/// Switch requests carry wall-clock targets that were produced on another
/// machine, so alignment needs a wall clock rather than a monotonic one.
pub trait WallClock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_recent() {
        let millis = now_millis();
        assert!(millis > 946_684_800_000); // 2000-01-01
        assert!(millis < 4_102_444_800_000); // 2100-01-01
    }

    #[tokio::test]
    async fn test_now_millis_advances() {
        let t1 = SystemClock.now_millis();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let t2 = SystemClock.now_millis();
        assert!(t2 >= t1 + 10);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::ZERO);
        assert_eq!(millis_to_duration(1000), Duration::from_secs(1));
        assert_eq!(millis_to_duration(u64::MAX).as_millis(), u64::MAX as u128);
    }

    #[test]
    fn test_seconds_to_duration() {
        assert_eq!(seconds_to_duration(1.5), Duration::from_millis(1500));
        assert_eq!(seconds_to_duration(0.0), Duration::ZERO);
        assert_eq!(seconds_to_duration(-3.0), Duration::ZERO);
        assert_eq!(seconds_to_duration(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_seconds_to_duration_saturates() {
        assert_eq!(seconds_to_duration(1e20), Duration::MAX);
        assert_eq!(seconds_to_duration(f64::INFINITY), Duration::MAX);
    }
}
