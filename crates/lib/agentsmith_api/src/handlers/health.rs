//! Liveness endpoint.

use axum::Json;

use crate::models::HealthResponse;

/// `GET /api/health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: agentsmith_core::version().to_string(),
    })
}
