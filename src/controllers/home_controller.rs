use axum::{http::StatusCode, response::IntoResponse};

/// Liveness probe for the process supervisor.
pub async fn home() -> impl IntoResponse {
    (StatusCode::OK, "Price alert worker is running...")
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}
