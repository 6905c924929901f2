//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};

use crate::api::models::HealthResponse;
use crate::core::Core;

/// `GET /health` — liveness only, no database round trip.
pub async fn health() -> impl axum::response::IntoResponse {
    Json(HealthResponse::new("ok", "unknown"))
}

/// `GET /health/detailed` — also checks the checkpoint database.
pub async fn health_detailed(State(core): State<Core>) -> (StatusCode, Json<HealthResponse>) {
    match core.db.health_check().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::new("ok", "connected"))),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::new("error", "error")),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() {
        let resp = health().await;
        let _ = resp;
    }
}
