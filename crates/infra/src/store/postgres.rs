//! Postgres-backed stores.
//!
//! Statuses are persisted as the legacy single-letter codes
//! (`A`/`B` for customers, `B`/`A`/`P` for invoices). Tax-id uniqueness and
//! the invoice → customer reference are enforced by the schema.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use finpay_core::{CustomerId, InvoiceId, Money};
use finpay_customers::{BlockStatus, Customer, TaxId};
use finpay_invoicing::{Invoice, InvoiceStatus};

use super::{CustomerStore, InvoiceStore, StoreError, StoreResult, Transition};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id           UUID PRIMARY KEY,
        name         VARCHAR(100) NOT NULL,
        tax_id       CHAR(11) NOT NULL,
        birth_date   DATE NOT NULL,
        block_status CHAR(1) NOT NULL,
        credit_limit NUMERIC(10, 2) NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS customers_tax_id_key ON customers (tax_id)",
    r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id           UUID PRIMARY KEY,
        customer_id  UUID NOT NULL REFERENCES customers (id),
        due_date     DATE NOT NULL,
        payment_date DATE,
        amount       NUMERIC(10, 2) NOT NULL,
        status       CHAR(1) NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS invoices_status_due_date_idx ON invoices (status, due_date)",
    "CREATE INDEX IF NOT EXISTS invoices_customer_id_idx ON invoices (customer_id)",
];

/// Create the `customers` and `invoices` tables if absent.
pub async fn ensure_schema(pool: &PgPool) -> StoreResult<()> {
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(pool).await.map_err(backend)?;
    }
    Ok(())
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::backend(err.to_string())
}

fn is_violation(err: &sqlx::Error, check: impl Fn(&dyn sqlx::error::DatabaseError) -> bool) -> bool {
    match err {
        sqlx::Error::Database(db) => check(db.as_ref()),
        _ => false,
    }
}

fn corrupt(what: &str, value: &str) -> StoreError {
    StoreError::backend(format!("stored {what} is invalid: {value:?}"))
}

fn customer_from_row(row: &PgRow) -> StoreResult<Customer> {
    let id: Uuid = row.try_get("id").map_err(backend)?;
    let name: String = row.try_get("name").map_err(backend)?;
    let tax_id: String = row.try_get("tax_id").map_err(backend)?;
    let birth_date: NaiveDate = row.try_get("birth_date").map_err(backend)?;
    let block_status: String = row.try_get("block_status").map_err(backend)?;
    let credit_limit: Decimal = row.try_get("credit_limit").map_err(backend)?;

    let tax_id = TaxId::parse(tax_id.trim()).map_err(|_| corrupt("tax id", &tax_id))?;
    let block_status = BlockStatus::from_code(block_status.trim())
        .ok_or_else(|| corrupt("block status", &block_status))?;
    let credit_limit = Money::from_decimal(credit_limit)
        .map_err(|_| corrupt("credit limit", &credit_limit.to_string()))?;

    Ok(Customer::restore(
        CustomerId::from_uuid(id),
        name,
        tax_id,
        birth_date,
        block_status,
        credit_limit,
    ))
}

fn invoice_from_row(row: &PgRow) -> StoreResult<Invoice> {
    let id: Uuid = row.try_get("id").map_err(backend)?;
    let customer_id: Uuid = row.try_get("customer_id").map_err(backend)?;
    let due_date: NaiveDate = row.try_get("due_date").map_err(backend)?;
    let payment_date: Option<NaiveDate> = row.try_get("payment_date").map_err(backend)?;
    let amount: Decimal = row.try_get("amount").map_err(backend)?;
    let status: String = row.try_get("status").map_err(backend)?;

    let amount =
        Money::from_decimal(amount).map_err(|_| corrupt("amount", &amount.to_string()))?;
    let status =
        InvoiceStatus::from_code(status.trim()).ok_or_else(|| corrupt("status", &status))?;

    Ok(Invoice::restore(
        InvoiceId::from_uuid(id),
        CustomerId::from_uuid(customer_id),
        due_date,
        payment_date,
        amount,
        status,
    ))
}

const CUSTOMER_COLUMNS: &str = "id, name, tax_id, birth_date, block_status, credit_limit";
const INVOICE_COLUMNS: &str = "id, customer_id, due_date, payment_date, amount, status";

/// Postgres customer store.
#[derive(Debug, Clone)]
pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(&self, clause: &str, bind: Option<&str>) -> StoreResult<Vec<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers {clause} ORDER BY id");
        let mut query = sqlx::query(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;
        rows.iter().map(customer_from_row).collect()
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    #[instrument(skip(self), fields(operation = "get_customer"))]
    async fn get(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Customer>> {
        self.fetch_where("", None).await
    }

    async fn list_by_status(&self, status: BlockStatus) -> StoreResult<Vec<Customer>> {
        self.fetch_where("WHERE block_status = $1", Some(status.code()))
            .await
    }

    async fn find_by_tax_id(&self, tax_id: &TaxId) -> StoreResult<Option<Customer>> {
        let mut found = self
            .fetch_where("WHERE tax_id = $1", Some(tax_id.as_str()))
            .await?;
        Ok(found.pop())
    }

    #[instrument(skip(self, customer), fields(operation = "upsert_customer", customer_id = %customer.id_typed()))]
    async fn upsert(&self, customer: &Customer) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, tax_id, birth_date, block_status, credit_limit)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                tax_id = EXCLUDED.tax_id,
                birth_date = EXCLUDED.birth_date,
                block_status = EXCLUDED.block_status,
                credit_limit = EXCLUDED.credit_limit
            "#,
        )
        .bind(*customer.id_typed().as_uuid())
        .bind(customer.name())
        .bind(customer.tax_id().as_str())
        .bind(customer.birth_date())
        .bind(customer.block_status().code())
        .bind(customer.credit_limit().amount())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_violation(&e, |db| db.is_unique_violation()) {
                return StoreError::DuplicateTaxId;
            }
            backend(e)
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(operation = "block_customer"))]
    async fn block_if_active(&self, id: CustomerId) -> StoreResult<Transition<Customer>> {
        let sql = format!(
            "UPDATE customers SET block_status = $2, credit_limit = 0 \
             WHERE id = $1 AND block_status = $3 RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .bind(BlockStatus::Blocked.code())
            .bind(BlockStatus::Active.code())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        match row {
            Some(row) => Ok(Transition::Applied(customer_from_row(&row)?)),
            None => Ok(Transition::unchanged(self.get(id).await?)),
        }
    }
}

/// Postgres invoice store.
#[derive(Debug, Clone)]
pub struct PgInvoiceStore {
    pool: PgPool,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, sql: &str) -> StoreResult<Vec<Invoice>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(invoice_from_row).collect()
    }
}

#[async_trait]
impl InvoiceStore for PgInvoiceStore {
    #[instrument(skip(self), fields(operation = "get_invoice"))]
    async fn get(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(invoice_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Invoice>> {
        self.fetch(&format!("SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY id"))
            .await
    }

    async fn list_by_status(&self, status: InvoiceStatus) -> StoreResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE status = $1 ORDER BY due_date, id"
        );
        let rows = sqlx::query(&sql)
            .bind(status.code())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(invoice_from_row).collect()
    }

    async fn list_by_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE customer_id = $1 ORDER BY due_date, id"
        );
        let rows = sqlx::query(&sql)
            .bind(*customer_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(invoice_from_row).collect()
    }

    #[instrument(skip(self), fields(operation = "list_overdue_invoices"))]
    async fn list_overdue_before(&self, cutoff: NaiveDate) -> StoreResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE status = $1 AND due_date < $2 ORDER BY due_date, id"
        );
        let rows = sqlx::query(&sql)
            .bind(InvoiceStatus::Overdue.code())
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(invoice_from_row).collect()
    }

    #[instrument(skip(self, invoice), fields(operation = "upsert_invoice", invoice_id = %invoice.id_typed()))]
    async fn upsert(&self, invoice: &Invoice) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoices (id, customer_id, due_date, payment_date, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id)
            DO UPDATE SET
                customer_id = EXCLUDED.customer_id,
                due_date = EXCLUDED.due_date,
                payment_date = EXCLUDED.payment_date,
                amount = EXCLUDED.amount,
                status = EXCLUDED.status
            "#,
        )
        .bind(*invoice.id_typed().as_uuid())
        .bind(*invoice.customer_id().as_uuid())
        .bind(invoice.due_date())
        .bind(invoice.payment_date())
        .bind(invoice.amount().amount())
        .bind(invoice.status().code())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_violation(&e, |db| db.is_foreign_key_violation()) {
                return StoreError::UnknownCustomer(invoice.customer_id());
            }
            backend(e)
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(operation = "pay_invoice"))]
    async fn mark_paid(
        &self,
        id: InvoiceId,
        payment_date: NaiveDate,
    ) -> StoreResult<Transition<Invoice>> {
        let sql = format!(
            "UPDATE invoices SET payment_date = $2, status = $3 \
             WHERE id = $1 AND status <> $3 RETURNING {INVOICE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .bind(payment_date)
            .bind(InvoiceStatus::Paid.code())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        match row {
            Some(row) => Ok(Transition::Applied(invoice_from_row(&row)?)),
            None => Ok(Transition::unchanged(self.get(id).await?)),
        }
    }

    #[instrument(skip(self), fields(operation = "mark_invoice_overdue"))]
    async fn mark_overdue(
        &self,
        id: InvoiceId,
        today: NaiveDate,
    ) -> StoreResult<Transition<Invoice>> {
        let sql = format!(
            "UPDATE invoices SET status = $2 \
             WHERE id = $1 AND status = $3 AND due_date < $4 RETURNING {INVOICE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .bind(InvoiceStatus::Overdue.code())
            .bind(InvoiceStatus::Open.code())
            .bind(today)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        match row {
            Some(row) => Ok(Transition::Applied(invoice_from_row(&row)?)),
            None => Ok(Transition::unchanged(self.get(id).await?)),
        }
    }
}
