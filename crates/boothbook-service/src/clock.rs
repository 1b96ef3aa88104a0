//! Wall-clock source for record timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

/// Source of `submitted_at` / `updated_at` stamps and of "today" for purges.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day in UTC.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The host clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// With a non-zero step every reading is strictly later than the previous
/// one, which keeps `updated_at > submitted_at` observable in tests.
#[derive(Debug)]
pub struct SimulatedClock {
    base: DateTime<Utc>,
    elapsed_ms: AtomicU64,
    step_ms: u64,
}

impl SimulatedClock {
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            elapsed_ms: AtomicU64::new(0),
            step_ms: 0,
        }
    }

    /// Advance by `step` after every reading.
    pub fn stepping(base: DateTime<Utc>, step: Duration) -> Self {
        Self {
            step_ms: step.as_millis() as u64,
            ..Self::new(base)
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.elapsed_ms.fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.elapsed_ms.fetch_add(self.step_ms, Ordering::Relaxed);
        self.base + chrono::Duration::milliseconds(elapsed as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn frozen_until_advanced() {
        let clock = SimulatedClock::new(base());
        assert_eq!(clock.now(), base());
        assert_eq!(clock.now(), base());
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), base() + chrono::Duration::seconds(90));
    }

    #[test]
    fn stepping_clock_is_strictly_increasing() {
        let clock = SimulatedClock::stepping(base(), Duration::from_millis(5));
        let a = clock.now();
        let b = clock.now();
        assert_eq!(a, base());
        assert!(b > a);
    }

    #[test]
    fn today_is_the_utc_day() {
        let late = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let clock = SimulatedClock::new(late);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
