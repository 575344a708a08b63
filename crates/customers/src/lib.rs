//! Customers domain module.
//!
//! Business rules for customer records (registration, update, blocking),
//! implemented as deterministic domain logic (no IO, no HTTP, no storage).

pub mod customer;
pub mod registration;

pub use customer::{BlockStatus, Customer, TaxId};
pub use registration::{normalize, CustomerDraft, CustomerProfile, NAME_MAX_CHARS};
