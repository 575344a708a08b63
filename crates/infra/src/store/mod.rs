//! Persistence for customers and invoices.
//!
//! Two async store traits with an in-memory implementation (dev/test
//! default) and a Postgres implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

use finpay_core::{CustomerId, InvoiceId};
use finpay_customers::{BlockStatus, Customer, TaxId};
use finpay_invoicing::{Invoice, InvoiceStatus};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryCustomerStore, InMemoryInvoiceStore};
pub use postgres::{PgCustomerStore, PgInvoiceStore, ensure_schema};

/// Store-level errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another customer already holds this tax id.
    #[error("tax id already registered")]
    DuplicateTaxId,

    /// An invoice references a customer that does not exist.
    #[error("unknown customer: {0}")]
    UnknownCustomer(CustomerId),

    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a conditional write.
///
/// The condition is checked and the change applied atomically, so two
/// racing callers never both see `Applied`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<T> {
    /// The condition held; carries the record as written.
    Applied(T),
    /// The condition did not hold; carries the record as stored.
    Unchanged(T),
    /// No record with that id.
    Missing,
}

impl<T> Transition<T> {
    /// Outcome for a write whose condition failed, given a fresh read.
    pub fn unchanged(current: Option<T>) -> Self {
        match current {
            Some(record) => Transition::Unchanged(record),
            None => Transition::Missing,
        }
    }
}

#[async_trait]
pub trait CustomerStore: Send + Sync + 'static {
    async fn get(&self, id: CustomerId) -> StoreResult<Option<Customer>>;

    async fn list(&self) -> StoreResult<Vec<Customer>>;

    async fn list_by_status(&self, status: BlockStatus) -> StoreResult<Vec<Customer>>;

    async fn find_by_tax_id(&self, tax_id: &TaxId) -> StoreResult<Option<Customer>>;

    /// Insert or replace by id. Fails with `DuplicateTaxId` when a different
    /// customer already holds the same tax id.
    async fn upsert(&self, customer: &Customer) -> StoreResult<()>;

    /// Block the customer and zero its credit limit if it is still active.
    ///
    /// Only the status and credit limit are written.
    async fn block_if_active(&self, id: CustomerId) -> StoreResult<Transition<Customer>>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync + 'static {
    async fn get(&self, id: InvoiceId) -> StoreResult<Option<Invoice>>;

    async fn list(&self) -> StoreResult<Vec<Invoice>>;

    async fn list_by_status(&self, status: InvoiceStatus) -> StoreResult<Vec<Invoice>>;

    async fn list_by_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<Invoice>>;

    /// Overdue invoices with `due_date < cutoff`.
    async fn list_overdue_before(&self, cutoff: NaiveDate) -> StoreResult<Vec<Invoice>>;

    async fn upsert(&self, invoice: &Invoice) -> StoreResult<()>;

    /// Record a payment unless the invoice is already paid.
    async fn mark_paid(
        &self,
        id: InvoiceId,
        payment_date: NaiveDate,
    ) -> StoreResult<Transition<Invoice>>;

    /// Flip the invoice to overdue if it is still open and due before `today`.
    async fn mark_overdue(
        &self,
        id: InvoiceId,
        today: NaiveDate,
    ) -> StoreResult<Transition<Invoice>>;
}

#[async_trait]
impl<S> CustomerStore for Arc<S>
where
    S: CustomerStore + ?Sized,
{
    async fn get(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        (**self).get(id).await
    }

    async fn list(&self) -> StoreResult<Vec<Customer>> {
        (**self).list().await
    }

    async fn list_by_status(&self, status: BlockStatus) -> StoreResult<Vec<Customer>> {
        (**self).list_by_status(status).await
    }

    async fn find_by_tax_id(&self, tax_id: &TaxId) -> StoreResult<Option<Customer>> {
        (**self).find_by_tax_id(tax_id).await
    }

    async fn upsert(&self, customer: &Customer) -> StoreResult<()> {
        (**self).upsert(customer).await
    }

    async fn block_if_active(&self, id: CustomerId) -> StoreResult<Transition<Customer>> {
        (**self).block_if_active(id).await
    }
}

#[async_trait]
impl<S> InvoiceStore for Arc<S>
where
    S: InvoiceStore + ?Sized,
{
    async fn get(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        (**self).get(id).await
    }

    async fn list(&self) -> StoreResult<Vec<Invoice>> {
        (**self).list().await
    }

    async fn list_by_status(&self, status: InvoiceStatus) -> StoreResult<Vec<Invoice>> {
        (**self).list_by_status(status).await
    }

    async fn list_by_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<Invoice>> {
        (**self).list_by_customer(customer_id).await
    }

    async fn list_overdue_before(&self, cutoff: NaiveDate) -> StoreResult<Vec<Invoice>> {
        (**self).list_overdue_before(cutoff).await
    }

    async fn upsert(&self, invoice: &Invoice) -> StoreResult<()> {
        (**self).upsert(invoice).await
    }

    async fn mark_paid(
        &self,
        id: InvoiceId,
        payment_date: NaiveDate,
    ) -> StoreResult<Transition<Invoice>> {
        (**self).mark_paid(id, payment_date).await
    }

    async fn mark_overdue(
        &self,
        id: InvoiceId,
        today: NaiveDate,
    ) -> StoreResult<Transition<Invoice>> {
        (**self).mark_overdue(id, today).await
    }
}
