//! Time sources.
//!
//! Everything that depends on "now" (debounce and backoff deadlines) or on
//! "today" (streaks, default entry dates) reads it through [`Clock`], so tests
//! can substitute a [`ManualClock`] and stay deterministic.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};

/// Source of monotonic time and of the current calendar day.
pub trait Clock: Send + Sync {
    /// Monotonic instant used for timer deadlines.
    fn now(&self) -> Instant;

    /// The current calendar day.
    fn today(&self) -> NaiveDate;
}

/// Real time, with "today" taken from the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    today: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            today: Mutex::new(today),
        }
    }

    /// Move monotonic time forward.
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap();
        *elapsed += by;
    }

    pub fn set_today(&self, today: NaiveDate) {
        *self.today.lock().unwrap() = today;
    }

    /// Time advanced since construction.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let start = clock.now();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now() - start, Duration::from_millis(1500));

        clock.set_today(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    }
}
