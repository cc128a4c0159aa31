use chrono::{DateTime, Utc};
use std::fmt;

/// Source of "now" for every timestamp the services record or evaluate against.
///
/// Production code injects [`SystemClock`]; tests pin time with a fixed clock.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
