//! leadhunt-vet library interface
//!
//! Exposes the pipeline stages and router for integration testing.

pub mod api;
pub mod config;
pub mod contracts;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::VetConfig;
use crate::pipeline::Pipeline;
use crate::services::Collaborators;
use leadhunt_common::events::EventBus;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// The wired pipeline stages
    pub pipeline: Arc<Pipeline>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        config: &VetConfig,
        collaborators: Collaborators,
        event_bus: EventBus,
    ) -> Self {
        let pipeline = Arc::new(Pipeline::new(
            db.clone(),
            config,
            collaborators,
            event_bus.clone(),
        ));
        Self {
            db,
            event_bus,
            pipeline,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::ingest_routes())
        .merge(api::review_routes())
        .merge(api::decision_routes())
        .route("/events", get(api::pipeline_event_stream))
        .merge(api::health_routes())
        .with_state(state)
}
