//! Daily overdue sweep: block customers whose overdue invoices have
//! outlived the grace window.
//!
//! The pass is not transactional. Each block is a conditional write on the
//! customer's current status, so a customer blocked earlier in the same pass
//! counts as already blocked and concurrent profile edits are kept. A failed
//! write is logged and the pass moves on.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use finpay_core::Clock;
use finpay_invoicing::{DEFAULT_GRACE_DAYS, block_cutoff};

use crate::services::{InvoiceService, ServiceResult};
use crate::store::{CustomerStore, InvoiceStore, Transition};

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub today: NaiveDate,
    pub cutoff: NaiveDate,
    /// Open invoices flipped to overdue before the sweep proper.
    pub marked_overdue: usize,
    /// Overdue invoices past the cutoff.
    pub examined: usize,
    pub blocked: usize,
    pub already_blocked: usize,
    pub missing_customers: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct OverdueSweep {
    customers: Arc<dyn CustomerStore>,
    invoices: Arc<dyn InvoiceStore>,
    invoice_service: InvoiceService,
    clock: Arc<dyn Clock>,
    grace_days: u32,
    mark_overdue: bool,
    /// Serializes passes, whether scheduled or manual.
    run_lock: Arc<Mutex<()>>,
}

impl OverdueSweep {
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        invoices: Arc<dyn InvoiceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let invoice_service = InvoiceService::new(invoices.clone(), customers.clone(), clock.clone());
        Self {
            customers,
            invoices,
            invoice_service,
            clock,
            grace_days: DEFAULT_GRACE_DAYS,
            mark_overdue: true,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_grace_days(mut self, days: u32) -> Self {
        self.grace_days = days;
        self
    }

    /// Whether open invoices past due are flipped to overdue first.
    pub fn with_overdue_marking(mut self, enabled: bool) -> Self {
        self.mark_overdue = enabled;
        self
    }

    pub fn grace_days(&self) -> u32 {
        self.grace_days
    }

    /// Run one pass for the clock's current date.
    ///
    /// Only listing failures abort the pass; per-customer failures are
    /// counted in the report.
    pub async fn run(&self) -> ServiceResult<SweepReport> {
        let _running = self.run_lock.lock().await;
        let today = self.clock.today();
        let cutoff = block_cutoff(today, self.grace_days);
        let mut report = SweepReport {
            today,
            cutoff,
            ..SweepReport::default()
        };

        if self.mark_overdue {
            report.marked_overdue = self.invoice_service.mark_overdue(today).await?;
        }

        let candidates = self.invoices.list_overdue_before(cutoff).await?;
        report.examined = candidates.len();

        for invoice in candidates {
            let customer_id = invoice.customer_id();
            match self.customers.block_if_active(customer_id).await {
                Ok(Transition::Applied(_)) => {
                    info!(
                        customer_id = %customer_id,
                        invoice_id = %invoice.id_typed(),
                        due_date = %invoice.due_date(),
                        "customer blocked for overdue invoice"
                    );
                    report.blocked += 1;
                }
                Ok(Transition::Unchanged(_)) => report.already_blocked += 1,
                Ok(Transition::Missing) => {
                    warn!(invoice_id = %invoice.id_typed(), customer_id = %customer_id, "overdue invoice references a missing customer");
                    report.missing_customers += 1;
                }
                Err(e) => {
                    warn!(customer_id = %customer_id, error = %e, "failed to block customer");
                    report.failed += 1;
                }
            }
        }

        info!(
            %today,
            %cutoff,
            marked_overdue = report.marked_overdue,
            examined = report.examined,
            blocked = report.blocked,
            already_blocked = report.already_blocked,
            missing_customers = report.missing_customers,
            failed = report.failed,
            "overdue sweep finished"
        );
        Ok(report)
    }
}
