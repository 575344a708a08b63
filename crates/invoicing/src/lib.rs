//! Invoicing domain module.
//!
//! Business rules for invoices: issuing, the payment rule and the overdue
//! rules used by the daily sweep. Pure logic (no IO, no HTTP, no storage).

pub mod invoice;
pub mod overdue;

pub use invoice::{Invoice, InvoiceStatus, check_payment_date};
pub use overdue::{DEFAULT_GRACE_DAYS, block_cutoff, blocks_customer};
