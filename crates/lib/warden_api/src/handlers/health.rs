//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::warn;

use crate::AppState;
use crate::models::HealthResponse;

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "warden-auth";

/// `GET /health` — 200 when the identity store answers, 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label) = match state.sessions.store().ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    let body = HealthResponse {
        status: label.to_string(),
        service: SERVICE_NAME.to_string(),
        version: warden_core::version().to_string(),
        timestamp: Utc::now(),
    };
    (status, Json(body))
}
