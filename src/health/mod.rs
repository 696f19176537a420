//! Health endpoints.
//!
//! # Endpoints
//! - `/health`: liveness; answers 200 as long as the process serves HTTP
//! - `/health/ready`: readiness; 503 while the document store is unreachable
//!
//! # Design Decisions
//! - Liveness never touches the store, so a slow database cannot fail it
//! - Neither endpoint is rate limited

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "success",
        message: "FarmeRice API is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

pub async fn readiness(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    state.store.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        ApiError::ServiceUnavailable("Database unavailable".to_string())
    })?;

    Ok(Json(HealthStatus {
        status: "success",
        message: "FarmeRice API is ready".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}
