//! Liveness probe.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use catalog_kernel::HealthCheck;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
}

/// GET /health
///
/// 200 when the store answers, 503 otherwise. A failing probe never
/// terminates the process.
async fn health(
    State(check): State<Arc<dyn HealthCheck>>,
) -> (StatusCode, Json<HealthResponse>) {
    if check.is_healthy().await {
        (StatusCode::OK, Json(HealthResponse { message: "healthy" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                message: "unhealthy",
            }),
        )
    }
}

/// Health routes, already bound to their probe.
pub fn router(check: Arc<dyn HealthCheck>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(check)
}
