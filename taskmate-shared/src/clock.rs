/// Injectable time source
///
/// Status rules depend on "today", so every operation that reads the time
/// takes it from a [`Clock`] instead of calling `Utc::now()` directly.
/// Production code uses [`DefaultClock`]; tests pin the date with
/// [`FixedClock`].

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::{Arc, RwLock};

pub use mockable::{Clock, DefaultClock};

/// Clock handle shared across requests
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Current UTC calendar date
pub fn today<C: Clock + ?Sized>(clock: &C) -> NaiveDate {
    clock.utc().date_naive()
}

/// Clock pinned to an instant that tests can move
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(RwLock::new(instant)),
        }
    }

    /// Moves the clock; clones share the same instant
    pub fn set(&self, instant: DateTime<Utc>) {
        match self.instant.write() {
            Ok(mut guard) => *guard = instant,
            Err(poisoned) => *poisoned.into_inner() = instant,
        }
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        match self.instant.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
