use axum::Router;

pub mod customers;
pub mod invoices;
pub mod jobs;
pub mod system;

/// Router for every endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .nest("/customers", customers::router())
        .nest("/invoices", invoices::router())
        .nest("/jobs", jobs::router())
}
