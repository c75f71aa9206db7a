//! HTTP API handlers for leadhunt-vet
//!
//! REST endpoints for ingest, decision lookup, and the manual review
//! lifecycle, plus an SSE stream of pipeline progress events.

pub mod decisions;
pub mod health;
pub mod ingest;
pub mod review;
pub mod sse;

pub use decisions::decision_routes;
pub use health::health_routes;
pub use ingest::ingest_routes;
pub use review::review_routes;
pub use sse::pipeline_event_stream;
