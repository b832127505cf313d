use std::fmt::Debug;

use chrono::{DateTime, Utc};

/// Source of "now". Injected so backoff and breaker timing can be tested
/// without real timers.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
