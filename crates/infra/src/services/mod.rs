//! Application services: one read-modify-write against the stores per call.

use thiserror::Error;

use finpay_core::{DomainError, ValidationErrors};

use crate::store::StoreError;

pub mod customers;
pub mod invoices;

pub use customers::CustomerService;
pub use invoices::{InvoiceService, InvoiceView};

/// Service-level error, mapped to HTTP statuses at the API edge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage or other infrastructure failure. The message is for logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(errors) => ServiceError::Validation(errors),
            DomainError::InvalidId(msg) => {
                ServiceError::Validation(finpay_core::FieldError::new("id", msg).into())
            }
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateTaxId => ServiceError::Conflict(value.to_string()),
            StoreError::UnknownCustomer(_) => ServiceError::NotFound("customer".to_string()),
            StoreError::Backend(msg) => ServiceError::Internal(msg),
        }
    }
}
