//! Wall-clock access.
//!
//! Predicates compare utilization windows against "now" and the capacity
//! scheduler reads the local time of day. Both go through [`Clock`] so runs can
//! be replayed at a fixed instant.

use chrono::{DateTime, Local, NaiveTime, Utc};

pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current local time of day.
    fn local_time(&self) -> NaiveTime;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_time(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// A clock frozen at a given instant and time of day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    local_time: NaiveTime,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, local_time: NaiveTime) -> Self {
        Self { now, local_time }
    }

    /// Fixed at `now`, with the local time of day taken from the same instant in UTC.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            local_time: now.time(),
        }
    }

    /// Same instant, different time of day.
    pub fn with_local_time(mut self, local_time: NaiveTime) -> Self {
        self.local_time = local_time;
        self
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn local_time(&self) -> NaiveTime {
        self.local_time
    }
}
