//! Injectable clock.
//!
//! The JWT minter needs `now` for `iat`/`exp` and the token cache needs
//! `now` for TTL expiry; both are tested against a fixed instant, so
//! `now()` is behind a trait rather than called directly from
//! `chrono::Utc::now()` or `std::time::Instant::now()`.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Wall-clock time, used for JWT `iat`/`exp` claims (unix seconds).
    fn now_unix(&self) -> i64;

    /// Monotonic instant, used for cache TTL bookkeeping.
    fn monotonic_now(&self) -> Instant;
}

/// Real clock backed by the system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn monotonic_now(&self) -> Instant {
        Instant::now()
    }
}

/// Fixed clock for deterministic tests. `monotonic_now` still advances
/// with the wall clock since `Instant` cannot be constructed from an
/// arbitrary point; tests that need TTL control should use short TTLs
/// and real sleeps, or assert via `now_unix()` directly.
pub struct FixedClock {
    unix: AtomicI64,
}

impl FixedClock {
    pub fn new(unix: i64) -> Self {
        Self {
            unix: AtomicI64::new(unix),
        }
    }

    pub fn set(&self, unix: i64) {
        self.unix.store(unix, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.unix.fetch_add(seconds, Ordering::SeqCst);
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.unix.load(Ordering::SeqCst), 0).unwrap_or_else(Utc::now)
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.unix.load(Ordering::SeqCst)
    }

    fn monotonic_now(&self) -> Instant {
        Instant::now()
    }
}
