//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status (e.g., "ok", "degraded")
    pub status: String,
    /// Module name ("leadhunt-vet")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Candidates still awaiting a verification branch at the join
    pub pending_joins: i64,
}

/// GET /health
///
/// Returns uptime and the pending-join backlog for monitoring.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let pending_joins = match state.pipeline.pending_joins().await {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to count pending joins for health check");
            -1
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "leadhunt-vet".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        pending_joins,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
