use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use finpay_core::CustomerId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(register_customer))
        .route("/blocked", get(list_blocked_customers))
        .route("/:id", get(get_customer).put(update_customer))
}

pub async fn register_customer(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CustomerRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection_to_response(rej),
    };

    match services.customers.register(body).await {
        Ok(c) => (StatusCode::CREATED, Json(dto::customer_to_json(&c))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::CustomerRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("customer"),
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection_to_response(rej),
    };

    match services.customers.update(id, body).await {
        Ok(c) => (StatusCode::OK, Json(dto::customer_to_json(&c))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("customer"),
    };

    match services.customers.get(id).await {
        Ok(c) => (StatusCode::OK, Json(dto::customer_to_json(&c))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.customers.list().await {
        Ok(list) => {
            let items = list.iter().map(dto::customer_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_blocked_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.customers.list_blocked().await {
        Ok(list) => {
            let items = list.iter().map(dto::customer_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
