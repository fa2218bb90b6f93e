//! Service-level handlers (index, health)

use axum::{http::StatusCode, response::IntoResponse};

/// Text served at the API root
pub const INDEX_TEXT: &str =
    "HoloStorage Accessor is running! See the API documentation for the available endpoints.";

/// GET / - Index
pub async fn index() -> impl IntoResponse {
    (StatusCode::OK, INDEX_TEXT)
}

/// GET /health - Liveness check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
