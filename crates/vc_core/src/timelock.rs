//! Time lock gating every reveal.
//!
//! The unlock instant is fixed at build time (`VC_UNLOCK_AT`, RFC 3339) and
//! cannot be moved at runtime.  `now` is always passed in.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Valentine's Day 2026, midnight UTC.
pub const DEFAULT_UNLOCK_AT: &str = "2026-02-14T00:00:00Z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLock {
    unlock_at: DateTime<Utc>,
}

impl TimeLock {
    pub fn new(unlock_at: DateTime<Utc>) -> Self {
        Self { unlock_at }
    }

    /// The lock compiled into this build.
    pub fn configured() -> Result<Self, chrono::ParseError> {
        let raw = option_env!("VC_UNLOCK_AT").unwrap_or(DEFAULT_UNLOCK_AT);
        let unlock_at = DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc);
        Ok(Self { unlock_at })
    }

    pub fn unlock_at(&self) -> DateTime<Utc> {
        self.unlock_at
    }

    pub fn is_unlocked(&self, now: DateTime<Utc>) -> bool {
        now >= self.unlock_at
    }

    /// Time left until unlock, `None` once unlocked.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Countdown> {
        if self.is_unlocked(now) {
            return None;
        }
        Some(Countdown::from_duration(self.unlock_at - now))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    fn from_duration(d: Duration) -> Self {
        let total = d.num_seconds();
        Self {
            days: total / 86_400,
            hours: (total / 3_600) % 24,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}
