//! Time source used by the cache and the retry loop.

use chrono::{DateTime, Utc};
use core::time::Duration;
use futures::future::{self, BoxFuture, FutureExt};
use std::sync::Mutex;

/// An injectable source of "now" and of delays.
///
/// Everything in the request pipeline that waits or checks expiry goes through a
/// `Clock`, so the retry and batching logic can be exercised without real delays.
pub trait Clock: Send + Sync + core::fmt::Debug {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend for `duration`.
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Production clock backed by the system time and tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}

/// A virtual clock whose `sleep` completes immediately and advances time.
///
/// Every requested delay is recorded so callers can assert on the backoff schedule.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move virtual time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().expect("lock not poisoned");
        let delta = chrono::Duration::from_std(duration).unwrap_or(chrono::TimeDelta::MAX);
        *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    /// All delays requested through [`Clock::sleep`], in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("lock not poisoned").clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("lock not poisoned")
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.sleeps.lock().expect("lock not poisoned").push(duration);
        self.advance(duration);
        future::ready(()).boxed()
    }
}
