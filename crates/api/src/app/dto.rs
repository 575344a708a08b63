use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use finpay_core::Submitted;
use finpay_customers::{Customer, CustomerDraft};
use finpay_infra::InvoiceView;

// -------------------------
// Request DTOs
// -------------------------

/// Register/update body. Every field is optional here; the registration
/// rule decides what is required.
pub type CustomerRequest = CustomerDraft;

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payment_date: Option<Submitted<NaiveDate>>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn customer_to_json(c: &Customer) -> serde_json::Value {
    json!({
        "id": c.id_typed().to_string(),
        "name": c.name(),
        "tax_id": c.tax_id().as_str(),
        "birth_date": c.birth_date(),
        "block_status": c.block_status().as_str(),
        "credit_limit": c.credit_limit(),
    })
}

pub fn invoice_to_json(v: &InvoiceView) -> serde_json::Value {
    let inv = &v.invoice;
    json!({
        "id": inv.id_typed().to_string(),
        "customer_id": inv.customer_id().to_string(),
        "customer_name": v.customer_name,
        "due_date": inv.due_date(),
        "payment_date": inv.payment_date(),
        "amount": inv.amount(),
        "status": inv.status().as_str(),
    })
}

pub fn items(values: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "items": values })
}
