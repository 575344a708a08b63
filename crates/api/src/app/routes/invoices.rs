use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use finpay_core::{CustomerId, InvoiceId, Submitted, ValidationErrors};
use finpay_infra::{InvoiceView, ServiceResult};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices))
        .route("/overdue", get(list_overdue_invoices))
        .route("/customer/:customer_id", get(list_customer_invoices))
        .route("/:id", get(get_invoice))
        .route("/:id/payment", put(pay_invoice))
}

pub async fn pay_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::PaymentRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("invoice"),
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection_to_response(rej),
    };
    let payment_date = match body.payment_date.map(Submitted::parsed) {
        Some(Some(date)) => date,
        Some(None) => return payment_date_error("payment date must be a date in YYYY-MM-DD format"),
        None => return payment_date_error("payment date is required"),
    };

    match services.invoices.pay(id, payment_date).await {
        Ok(v) => (StatusCode::OK, Json(dto::invoice_to_json(&v))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("invoice"),
    };

    match services.invoices.get(id).await {
        Ok(v) => (StatusCode::OK, Json(dto::invoice_to_json(&v))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    list_response(services.invoices.list().await)
}

pub async fn list_overdue_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    list_response(services.invoices.list_overdue().await)
}

pub async fn list_customer_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer_id): Path<String>,
) -> axum::response::Response {
    let customer_id: CustomerId = match customer_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("customer"),
    };
    list_response(services.invoices.list_for_customer(customer_id).await)
}

fn payment_date_error(message: &str) -> axum::response::Response {
    let mut invalid = ValidationErrors::new();
    invalid.push("payment_date", message);
    errors::validation_error(&invalid)
}

fn list_response(result: ServiceResult<Vec<InvoiceView>>) -> axum::response::Response {
    match result {
        Ok(list) => {
            let items = list.iter().map(dto::invoice_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
