//! `finpay-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod clock;
pub mod error;
pub mod id;
pub mod input;
pub mod value_object;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult, FieldError, ValidationErrors};
pub use id::{CustomerId, InvoiceId};
pub use input::Submitted;
pub use value_object::{Money, MoneyError};
