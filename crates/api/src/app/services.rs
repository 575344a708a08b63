use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use finpay_core::{Clock, SystemClock};
use finpay_infra::{
    CustomerService, CustomerStore, InMemoryCustomerStore, InMemoryInvoiceStore, InvoiceService,
    InvoiceStore, OverdueSweep, PgCustomerStore, PgInvoiceStore, ensure_schema,
};

use crate::config::ApiConfig;

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub customers: CustomerService,
    pub invoices: InvoiceService,
    pub sweep: OverdueSweep,
}

impl AppServices {
    pub fn from_stores(
        customers: Arc<dyn CustomerStore>,
        invoices: Arc<dyn InvoiceStore>,
        clock: Arc<dyn Clock>,
        config: &ApiConfig,
    ) -> Self {
        let sweep = OverdueSweep::new(customers.clone(), invoices.clone(), clock.clone())
            .with_grace_days(config.sweep_grace_days)
            .with_overdue_marking(config.mark_overdue_enabled);
        Self {
            customers: CustomerService::new(customers.clone(), clock.clone()),
            invoices: InvoiceService::new(invoices, customers, clock),
            sweep,
        }
    }

    /// In-memory stores; the invoice store checks customer references.
    pub fn in_memory(clock: Arc<dyn Clock>, config: &ApiConfig) -> Self {
        let customers = Arc::new(InMemoryCustomerStore::new());
        let invoices = Arc::new(InMemoryInvoiceStore::with_customers(customers.clone()));
        Self::from_stores(customers, invoices, clock, config)
    }
}

/// Pick the store backend from configuration and wire the services.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let Some(url) = config.database_url.as_deref() else {
        tracing::info!("DATABASE_URL not set; using in-memory stores");
        return Ok(AppServices::in_memory(clock, config));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;
    ensure_schema(&pool)
        .await
        .context("failed to create database schema")?;
    tracing::info!("using Postgres stores");

    Ok(AppServices::from_stores(
        Arc::new(PgCustomerStore::new(pool.clone())),
        Arc::new(PgInvoiceStore::new(pool)),
        clock,
        config,
    ))
}
