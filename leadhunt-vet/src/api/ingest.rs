//! Candidate document ingest endpoint

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::json;

use crate::contracts;
use crate::error::ApiResult;
use crate::AppState;
use leadhunt_common::model::CandidateDocument;

/// POST /ingest
///
/// Accepts a candidate document and runs it through the pipeline in the
/// background. The document contract is checked synchronously so the caller
/// gets a 400 for a malformed submission instead of a silent drop; everything
/// after that is asynchronous and progress is observable on `/events`.
pub async fn ingest_document(
    State(state): State<AppState>,
    Json(document): Json<CandidateDocument>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    contracts::validate(&document).map_err(crate::error::ApiError::Common)?;

    let identity_key = document.source_url.clone();
    tracing::info!(identity_key = %identity_key, "Candidate document accepted");

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        if let Err(e) = pipeline.process_document(document).await {
            tracing::error!(error = %e, "Pipeline run failed");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "accepted",
            "identityKey": identity_key,
        })),
    ))
}

/// Build ingest routes
pub fn ingest_routes() -> Router<AppState> {
    Router::new().route("/ingest", post(ingest_document))
}
