use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::app::services::AppServices;
use crate::app::errors;

pub fn router() -> Router {
    Router::new().route("/overdue-sweep", post(run_overdue_sweep))
}

/// Run overdue marking and the sweep now, waiting for the report.
pub async fn run_overdue_sweep(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.sweep.run().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
