//! Infrastructure layer: stores, application services, scheduled jobs.

pub mod jobs;
pub mod services;
pub mod store;

pub use jobs::{OverdueSweep, SweepReport, SweepScheduler, SweepSchedulerHandle};
pub use services::{CustomerService, InvoiceService, InvoiceView, ServiceError, ServiceResult};
pub use store::{
    CustomerStore, InMemoryCustomerStore, InMemoryInvoiceStore, InvoiceStore, PgCustomerStore,
    PgInvoiceStore, StoreError, StoreResult, ensure_schema,
};
