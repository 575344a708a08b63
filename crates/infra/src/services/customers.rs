use std::sync::Arc;

use tracing::info;

use finpay_core::{Clock, CustomerId};
use finpay_customers::{BlockStatus, Customer, CustomerDraft, TaxId, normalize};

use super::{ServiceError, ServiceResult};
use crate::store::{CustomerStore, StoreError};

/// Registration, update and lookup of customers.
#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn CustomerStore>,
    clock: Arc<dyn Clock>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn CustomerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn register(&self, draft: CustomerDraft) -> ServiceResult<Customer> {
        let profile = normalize(draft, self.clock.today())?;
        self.ensure_tax_id_free(profile.tax_id(), None).await?;

        let customer = Customer::register(CustomerId::new(), profile);
        self.store.upsert(&customer).await?;

        info!(
            customer_id = %customer.id_typed(),
            block_status = customer.block_status().as_str(),
            "customer registered"
        );
        Ok(customer)
    }

    /// Merge `edit` onto the stored record, normalize, persist.
    pub async fn update(&self, id: CustomerId, edit: CustomerDraft) -> ServiceResult<Customer> {
        let mut customer = self.require(id).await?;

        let profile = normalize(edit.merged_onto(&customer), self.clock.today())?;
        self.ensure_tax_id_free(profile.tax_id(), Some(id)).await?;

        let was_blocked = customer.is_blocked();
        customer.apply_profile(profile);
        self.store.upsert(&customer).await?;

        if was_blocked && !customer.is_blocked() {
            info!(customer_id = %id, "customer reactivated");
        }
        info!(customer_id = %id, "customer updated");
        Ok(customer)
    }

    pub async fn get(&self, id: CustomerId) -> ServiceResult<Customer> {
        self.require(id).await
    }

    pub async fn list(&self) -> ServiceResult<Vec<Customer>> {
        Ok(self.store.list().await?)
    }

    pub async fn list_blocked(&self) -> ServiceResult<Vec<Customer>> {
        Ok(self.store.list_by_status(BlockStatus::Blocked).await?)
    }

    async fn require(&self, id: CustomerId) -> ServiceResult<Customer> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("customer".to_string()))
    }

    async fn ensure_tax_id_free(
        &self,
        tax_id: &TaxId,
        owner: Option<CustomerId>,
    ) -> ServiceResult<()> {
        match self.store.find_by_tax_id(tax_id).await? {
            Some(existing) if Some(existing.id_typed()) != owner => {
                Err(StoreError::DuplicateTaxId.into())
            }
            _ => Ok(()),
        }
    }
}
