//! Test utilities for the circulation crate.
//!
//! Shared helpers for both unit tests (in `src/`) and integration tests
//! (in `tests/`).

pub mod clock {
    //! Deterministic clock double for lending tests.

    use std::sync::Mutex;

    use chrono::{DateTime, Local, TimeDelta, Utc};
    use mockable::Clock;

    /// Clock whose current instant is set by the test and advanced manually.
    pub struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        /// Move the clock forward (or backward, with a negative delta).
        pub fn advance(&self, delta: TimeDelta) {
            *self.lock_clock() += delta;
        }

        /// Move the clock forward by whole days.
        pub fn advance_days(&self, days: i64) {
            self.advance(TimeDelta::days(days));
        }

        fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
            match self.0.lock() {
                Ok(guard) => guard,
                Err(_) => panic!("clock mutex"),
            }
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.lock_clock()
        }
    }
}
