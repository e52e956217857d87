//! Injected time source.
//!
//! Due-date classification and year rollover are date arithmetic; wiring
//! them to the wall clock directly would make them untestable. Every
//! component that needs "now" takes a `&dyn Clock` instead.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the current date/time for scheduling and rollover logic.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> NaiveDateTime;

    /// Milliseconds since the unix epoch — the numeric component of
    /// fallback sequence codes.
    fn now_millis(&self) -> i64 {
        self.now().and_utc().timestamp_millis()
    }
}

/// Wall-clock implementation (local timezone, as dates are entered by
/// pharmacy staff in local time).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().naive_local().date()
    }

    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Fixed clock for tests and replay.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn on_date(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(12, 0, 0).expect("noon is a valid time"))
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0.date()
    }

    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
