//! Clock collaborator.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the current local date-time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    /// Current calendar day.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock in the process-local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one instant. Used by tests and replay tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    at: NaiveDateTime,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.at
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
