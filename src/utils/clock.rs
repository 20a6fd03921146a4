use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Source of "now", already shifted into the school's timezone. Period and
/// date decisions are only ever made on values from here.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

#[cfg(test)]
pub use fixed::FixedClock;
