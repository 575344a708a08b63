//! Source of "today" for date-relative rules.
//!
//! Birth dates must be in the past, payment dates must not be in the future
//! and the overdue sweep computes its cutoff from the current date. Rules take
//! the date as a plain argument; services ask a `Clock` for it.

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync + 'static {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the server's local timezone.
#[derive(Debug, Copy, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a date (tests, replays).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
