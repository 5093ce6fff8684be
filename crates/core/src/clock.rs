//! Time source abstraction.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Source of "now" for expiry and timestamp decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `now + ttl` left the representable calendar range.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
#[error("expiry {ttl} after {now} is out of range")]
pub struct ExpiryOverflow {
    pub now: DateTime<Utc>,
    pub ttl: Duration,
}

/// Instant `ttl` after `now`, without panicking on overflow.
pub fn expires_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, ExpiryOverflow> {
    now.checked_add_signed(ttl).ok_or(ExpiryOverflow { now, ttl })
}

/// Manually driven clock for deterministic tests.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
