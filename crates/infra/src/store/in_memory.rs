use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use finpay_core::{CustomerId, InvoiceId};
use finpay_customers::{BlockStatus, Customer, TaxId};
use finpay_invoicing::{Invoice, InvoiceStatus, blocks_customer};

use super::{CustomerStore, InvoiceStore, StoreError, StoreResult, Transition};

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StoreError::backend("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StoreError::backend("in-memory store lock poisoned"))
}

/// In-memory customer store for tests/dev.
///
/// Listing follows id order, which for UUIDv7 ids is creation order.
#[derive(Debug, Default)]
pub struct InMemoryCustomerStore {
    inner: RwLock<BTreeMap<CustomerId, Customer>>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(&self, pred: impl Fn(&Customer) -> bool) -> StoreResult<Vec<Customer>> {
        let map = read(&self.inner)?;
        Ok(map.values().filter(|c| pred(c)).cloned().collect())
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn get(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let map = read(&self.inner)?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Customer>> {
        self.filtered(|_| true)
    }

    async fn list_by_status(&self, status: BlockStatus) -> StoreResult<Vec<Customer>> {
        self.filtered(|c| c.block_status() == status)
    }

    async fn find_by_tax_id(&self, tax_id: &TaxId) -> StoreResult<Option<Customer>> {
        let map = read(&self.inner)?;
        Ok(map.values().find(|c| c.tax_id() == tax_id).cloned())
    }

    async fn upsert(&self, customer: &Customer) -> StoreResult<()> {
        let mut map = write(&self.inner)?;
        let id = customer.id_typed();
        let taken = map
            .values()
            .any(|c| c.id_typed() != id && c.tax_id() == customer.tax_id());
        if taken {
            return Err(StoreError::DuplicateTaxId);
        }
        map.insert(id, customer.clone());
        Ok(())
    }

    async fn block_if_active(&self, id: CustomerId) -> StoreResult<Transition<Customer>> {
        let mut map = write(&self.inner)?;
        let Some(customer) = map.get_mut(&id) else {
            return Ok(Transition::Missing);
        };
        if customer.block() {
            Ok(Transition::Applied(customer.clone()))
        } else {
            Ok(Transition::Unchanged(customer.clone()))
        }
    }
}

/// In-memory invoice store for tests/dev.
///
/// When linked to a customer store, upserts referencing an unknown customer
/// fail with `UnknownCustomer`.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    inner: RwLock<BTreeMap<InvoiceId, Invoice>>,
    customers: Option<Arc<InMemoryCustomerStore>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customers(customers: Arc<InMemoryCustomerStore>) -> Self {
        Self {
            inner: RwLock::default(),
            customers: Some(customers),
        }
    }

    fn filtered(&self, pred: impl Fn(&Invoice) -> bool) -> StoreResult<Vec<Invoice>> {
        let map = read(&self.inner)?;
        Ok(map.values().filter(|i| pred(i)).cloned().collect())
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn get(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        let map = read(&self.inner)?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Invoice>> {
        self.filtered(|_| true)
    }

    async fn list_by_status(&self, status: InvoiceStatus) -> StoreResult<Vec<Invoice>> {
        self.filtered(|i| i.status() == status)
    }

    async fn list_by_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<Invoice>> {
        self.filtered(|i| i.customer_id() == customer_id)
    }

    async fn list_overdue_before(&self, cutoff: NaiveDate) -> StoreResult<Vec<Invoice>> {
        self.filtered(|i| blocks_customer(i, cutoff))
    }

    async fn upsert(&self, invoice: &Invoice) -> StoreResult<()> {
        if let Some(customers) = &self.customers {
            let customer_id = invoice.customer_id();
            if customers.get(customer_id).await?.is_none() {
                return Err(StoreError::UnknownCustomer(customer_id));
            }
        }
        let mut map = write(&self.inner)?;
        map.insert(invoice.id_typed(), invoice.clone());
        Ok(())
    }

    async fn mark_paid(
        &self,
        id: InvoiceId,
        payment_date: NaiveDate,
    ) -> StoreResult<Transition<Invoice>> {
        let mut map = write(&self.inner)?;
        let Some(invoice) = map.get_mut(&id) else {
            return Ok(Transition::Missing);
        };
        match invoice.pay(payment_date) {
            Ok(()) => Ok(Transition::Applied(invoice.clone())),
            Err(_) => Ok(Transition::Unchanged(invoice.clone())),
        }
    }

    async fn mark_overdue(
        &self,
        id: InvoiceId,
        today: NaiveDate,
    ) -> StoreResult<Transition<Invoice>> {
        let mut map = write(&self.inner)?;
        let Some(invoice) = map.get_mut(&id) else {
            return Ok(Transition::Missing);
        };
        if invoice.mark_overdue(today) {
            Ok(Transition::Applied(invoice.clone()))
        } else {
            Ok(Transition::Unchanged(invoice.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use finpay_customers::{CustomerDraft, normalize};
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
    }

    fn customer(tax_id: &str) -> Customer {
        let draft = CustomerDraft {
            name: Some("Cliente".to_string()),
            tax_id: Some(tax_id.to_string()),
            birth_date: NaiveDate::from_ymd_opt(1980, 2, 2).map(Into::into),
            ..CustomerDraft::default()
        };
        Customer::register(CustomerId::new(), normalize(draft, today()).unwrap())
    }

    #[tokio::test]
    async fn customer_upsert_rejects_duplicate_tax_id() {
        let store = InMemoryCustomerStore::new();
        let first = customer("11111111111");
        store.upsert(&first).await.unwrap();

        // Re-saving the same customer is fine.
        store.upsert(&first).await.unwrap();

        let clash = customer("11111111111");
        assert_eq!(store.upsert(&clash).await, Err(StoreError::DuplicateTaxId));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn customer_queries_filter_by_status_and_tax_id() {
        let store = InMemoryCustomerStore::new();
        let active = customer("11111111111");
        let mut blocked = customer("22222222222");
        blocked.block();
        store.upsert(&active).await.unwrap();
        store.upsert(&blocked).await.unwrap();

        let found = store.list_by_status(BlockStatus::Blocked).await.unwrap();
        assert_eq!(found, vec![blocked.clone()]);

        let tax_id = TaxId::parse("11111111111").unwrap();
        assert_eq!(store.find_by_tax_id(&tax_id).await.unwrap(), Some(active));
    }

    #[tokio::test]
    async fn invoice_store_checks_customer_when_linked() {
        let customers = Arc::new(InMemoryCustomerStore::new());
        let invoices = InMemoryInvoiceStore::with_customers(customers.clone());

        let owner = customer("11111111111");
        let stray = Invoice::issue(InvoiceId::new(), owner.id_typed(), today(), Decimal::ONE)
            .unwrap();
        assert_eq!(
            invoices.upsert(&stray).await,
            Err(StoreError::UnknownCustomer(owner.id_typed()))
        );

        customers.upsert(&owner).await.unwrap();
        invoices.upsert(&stray).await.unwrap();
        assert_eq!(invoices.list_by_customer(owner.id_typed()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn block_if_active_only_touches_status_and_credit() {
        let store = InMemoryCustomerStore::new();
        let original = customer("11111111111");
        store.upsert(&original).await.unwrap();

        // A later profile edit must survive the block.
        let draft = CustomerDraft {
            name: Some("Renamed".to_string()),
            tax_id: Some("11111111111".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1980, 2, 2).map(Into::into),
            credit_limit: Some(Decimal::new(90000, 2).into()),
            ..CustomerDraft::default()
        };
        let mut renamed = original.clone();
        renamed.apply_profile(normalize(draft, today()).unwrap());
        store.upsert(&renamed).await.unwrap();

        let blocked = match store.block_if_active(original.id_typed()).await.unwrap() {
            Transition::Applied(c) => c,
            other => panic!("expected block to apply, got {other:?}"),
        };
        assert_eq!(blocked.name(), "Renamed");
        assert!(blocked.is_blocked());
        assert!(blocked.credit_limit().is_zero());

        assert_eq!(
            store.block_if_active(original.id_typed()).await.unwrap(),
            Transition::Unchanged(blocked)
        );
        assert_eq!(
            store.block_if_active(CustomerId::new()).await.unwrap(),
            Transition::Missing
        );
    }

    #[tokio::test]
    async fn mark_paid_applies_once() {
        let invoices = InMemoryInvoiceStore::new();
        let inv = Invoice::issue(InvoiceId::new(), CustomerId::new(), today(), Decimal::ONE)
            .unwrap();
        invoices.upsert(&inv).await.unwrap();

        let first = today() - Days::new(1);
        let paid = match invoices.mark_paid(inv.id_typed(), first).await.unwrap() {
            Transition::Applied(i) => i,
            other => panic!("expected payment to apply, got {other:?}"),
        };
        assert_eq!(paid.payment_date(), Some(first));

        assert_eq!(
            invoices.mark_paid(inv.id_typed(), today()).await.unwrap(),
            Transition::Unchanged(paid)
        );
        assert_eq!(
            invoices.mark_paid(InvoiceId::new(), today()).await.unwrap(),
            Transition::Missing
        );
    }

    #[tokio::test]
    async fn mark_overdue_skips_paid_and_not_yet_due() {
        let invoices = InMemoryInvoiceStore::new();
        let owner = CustomerId::new();
        let late = Invoice::issue(InvoiceId::new(), owner, today() - Days::new(1), Decimal::ONE)
            .unwrap();
        let due_today = Invoice::issue(InvoiceId::new(), owner, today(), Decimal::ONE).unwrap();
        invoices.upsert(&late).await.unwrap();
        invoices.upsert(&due_today).await.unwrap();

        invoices.mark_paid(late.id_typed(), today()).await.unwrap();
        assert!(matches!(
            invoices.mark_overdue(late.id_typed(), today()).await.unwrap(),
            Transition::Unchanged(i) if i.is_paid()
        ));
        assert!(matches!(
            invoices.mark_overdue(due_today.id_typed(), today()).await.unwrap(),
            Transition::Unchanged(_)
        ));
    }

    #[tokio::test]
    async fn overdue_before_uses_strict_cutoff() {
        let invoices = InMemoryInvoiceStore::new();
        let owner = CustomerId::new();
        let cutoff = today() - Days::new(3);

        for days in [2u64, 3, 4] {
            let mut inv = Invoice::issue(
                InvoiceId::new(),
                owner,
                today() - Days::new(days),
                Decimal::ONE,
            )
            .unwrap();
            inv.mark_overdue(today());
            invoices.upsert(&inv).await.unwrap();
        }

        let hits = invoices.list_overdue_before(cutoff).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].due_date(), today() - Days::new(4));
    }
}
