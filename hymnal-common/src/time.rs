//! Timestamp utilities

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Millisecond config values as a `Duration`
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Whole days elapsed between `since` and `at`
///
/// Truncates toward zero, so 25 hours is one day. Timestamps in the future
/// (clock skew between client and server) count as zero.
pub fn days_between(since: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    (at - since).num_days().max(0)
}

/// Source of wall-clock time
///
/// Derived values such as a favorite's age are computed against a clock so
/// tests can move time forward without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and replay
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_system_clock_tracks_wall_time() {
        let before = Utc::now();
        let reading = SystemClock.now();
        assert!(reading >= before);
        assert!(reading <= Utc::now());
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(8000), Duration::from_secs(8));
        assert_eq!(millis_to_duration(300), Duration::from_millis(300));
    }

    #[test]
    fn test_days_between_truncates() {
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(days_between(t, t), 0);
        assert_eq!(days_between(t, t + chrono::Duration::hours(23)), 0);
        assert_eq!(days_between(t, t + chrono::Duration::hours(25)), 1);
        assert_eq!(days_between(t, t + chrono::Duration::days(30)), 30);
    }

    #[test]
    fn test_days_between_future_is_zero() {
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(days_between(t + chrono::Duration::days(2), t), 0);
    }

    #[test]
    fn test_manual_clock_advance() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        let shared = clock.clone();
        shared.advance(chrono::Duration::hours(25));
        assert_eq!(clock.now(), start + chrono::Duration::hours(25));

        clock.set(start);
        assert_eq!(shared.now(), start);
    }
}
