//! Overdue rules shared by the daily sweep.

use chrono::{Days, NaiveDate};

use crate::invoice::{Invoice, InvoiceStatus};

/// Days an invoice may stay overdue before its customer is blocked.
pub const DEFAULT_GRACE_DAYS: u32 = 3;

/// Invoices due strictly before this date block their customer.
pub fn block_cutoff(today: NaiveDate, grace_days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(grace_days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Whether `invoice` is overdue and past the grace window ending at `cutoff`.
pub fn blocks_customer(invoice: &Invoice, cutoff: NaiveDate) -> bool {
    invoice.status() == InvoiceStatus::Overdue && invoice.due_date() < cutoff
}
