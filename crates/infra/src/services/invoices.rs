use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use finpay_core::{Clock, CustomerId, DomainError, InvoiceId};
use finpay_invoicing::{Invoice, InvoiceStatus, check_payment_date};

use super::{ServiceError, ServiceResult};
use crate::store::{CustomerStore, InvoiceStore, Transition};

/// An invoice together with its owner's name.
///
/// `customer_name` is `None` only when the owning record is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceView {
    pub invoice: Invoice,
    pub customer_name: Option<String>,
}

/// Invoice lookup, payment and overdue marking.
#[derive(Clone)]
pub struct InvoiceService {
    invoices: Arc<dyn InvoiceStore>,
    customers: Arc<dyn CustomerStore>,
    clock: Arc<dyn Clock>,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        customers: Arc<dyn CustomerStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            invoices,
            customers,
            clock,
        }
    }

    /// Issue an open invoice for an existing customer.
    pub async fn issue(
        &self,
        customer_id: CustomerId,
        due_date: NaiveDate,
        amount: Decimal,
    ) -> ServiceResult<Invoice> {
        if self.customers.get(customer_id).await?.is_none() {
            return Err(ServiceError::NotFound("customer".to_string()));
        }
        let invoice = Invoice::issue(InvoiceId::new(), customer_id, due_date, amount)?;
        self.invoices.upsert(&invoice).await?;
        info!(invoice_id = %invoice.id_typed(), customer_id = %customer_id, "invoice issued");
        Ok(invoice)
    }

    /// Record a payment on an open or overdue invoice.
    ///
    /// The paid check and the write are one store operation, so of two
    /// concurrent payments exactly one succeeds.
    pub async fn pay(&self, id: InvoiceId, payment_date: NaiveDate) -> ServiceResult<InvoiceView> {
        check_payment_date(payment_date, self.clock.today())?;

        let invoice = match self.invoices.mark_paid(id, payment_date).await? {
            Transition::Applied(invoice) => invoice,
            Transition::Unchanged(_) => return Err(DomainError::conflict("already paid").into()),
            Transition::Missing => return Err(ServiceError::NotFound("invoice".to_string())),
        };

        info!(invoice_id = %id, payment_date = %payment_date, "invoice paid");
        self.view(invoice).await
    }

    pub async fn get(&self, id: InvoiceId) -> ServiceResult<InvoiceView> {
        let invoice = self
            .invoices
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("invoice".to_string()))?;
        self.view(invoice).await
    }

    pub async fn list(&self) -> ServiceResult<Vec<InvoiceView>> {
        let invoices = self.invoices.list().await?;
        self.views(invoices).await
    }

    pub async fn list_overdue(&self) -> ServiceResult<Vec<InvoiceView>> {
        let invoices = self.invoices.list_by_status(InvoiceStatus::Overdue).await?;
        self.views(invoices).await
    }

    pub async fn list_for_customer(&self, customer_id: CustomerId) -> ServiceResult<Vec<InvoiceView>> {
        let customer = self
            .customers
            .get(customer_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("customer".to_string()))?;
        let invoices = self.invoices.list_by_customer(customer_id).await?;
        Ok(invoices
            .into_iter()
            .map(|invoice| InvoiceView {
                invoice,
                customer_name: Some(customer.name().to_string()),
            })
            .collect())
    }

    /// Flip every open invoice due before `today` to overdue.
    ///
    /// A failed write is logged and skipped. Returns how many were marked.
    pub async fn mark_overdue(&self, today: NaiveDate) -> ServiceResult<usize> {
        let open = self.invoices.list_by_status(InvoiceStatus::Open).await?;
        let mut marked = 0;
        for invoice in open.iter().filter(|i| i.due_date() < today) {
            let id = invoice.id_typed();
            match self.invoices.mark_overdue(id, today).await {
                Ok(Transition::Applied(_)) => marked += 1,
                // Paid or changed since the listing.
                Ok(_) => {}
                Err(e) => {
                    warn!(invoice_id = %id, error = %e, "failed to mark invoice overdue");
                }
            }
        }
        if marked > 0 {
            info!(marked, %today, "invoices marked overdue");
        }
        Ok(marked)
    }

    async fn view(&self, invoice: Invoice) -> ServiceResult<InvoiceView> {
        let customer_name = self
            .customers
            .get(invoice.customer_id())
            .await?
            .map(|c| c.name().to_string());
        Ok(InvoiceView {
            invoice,
            customer_name,
        })
    }

    async fn views(&self, invoices: Vec<Invoice>) -> ServiceResult<Vec<InvoiceView>> {
        let names: HashMap<CustomerId, String> = self
            .customers
            .list()
            .await?
            .into_iter()
            .map(|c| (c.id_typed(), c.name().to_string()))
            .collect();
        Ok(invoices
            .into_iter()
            .map(|invoice| {
                let customer_name = names.get(&invoice.customer_id()).cloned();
                InvoiceView {
                    invoice,
                    customer_name,
                }
            })
            .collect())
    }
}
