//! Manual review lifecycle endpoints
//!
//! Listing pending entries and resolving one with a human correction. The
//! correction path is deliberately ordered: the correction is durably
//! appended first, the queue entry removed second. A crash in between leaves
//! a resolved-looking entry in the queue, which a reviewer resolves again
//! harmlessly; the reverse order could lose a correction.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::contracts;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use leadhunt_common::events::PipelineEvent;
use leadhunt_common::model::{AnalysisRecord, CorrectionRecord, ManualReviewEntry};

/// GET /review
///
/// All entries currently awaiting human review, oldest first.
pub async fn list_review_entries(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ManualReviewEntry>>> {
    let entries = db::review::list(&state.db).await.map_err(ApiError::Common)?;
    Ok(Json(entries))
}

/// POST /review/correction
///
/// Resolve a review entry with a corrected analysis. The body is the
/// corrected analysis plus the `entryId` being resolved; a submission with
/// no entry id is rejected outright since there is nothing to resolve it
/// against.
pub async fn submit_correction(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<serde_json::Value>> {
    // Pull the entry id out by hand so its absence gets a specific error
    // code rather than a generic deserialization failure
    let entry_id = body
        .get("entryId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ApiError::MissingIdentifier("correction must name the 'entryId' it resolves".to_string())
        })?;
    let entry_id = Uuid::parse_str(entry_id)
        .map_err(|e| ApiError::BadRequest(format!("'entryId' is not a valid UUID: {}", e)))?;

    let corrected: AnalysisRecord = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("malformed corrected analysis: {}", e)))?;
    contracts::validate(&corrected).map_err(ApiError::Common)?;

    let entry = db::review::find(&state.db, entry_id)
        .await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("no review entry with id {}", entry_id)))?;

    // Durable append before removal
    let correction = CorrectionRecord {
        entry_id: entry.entry_id,
        corrected,
    };
    db::corrections::append(&state.db, &correction)
        .await
        .map_err(ApiError::Common)?;
    db::review::remove(&state.db, entry.entry_id)
        .await
        .map_err(ApiError::Common)?;

    tracing::info!(
        entry_id = %entry.entry_id,
        identity_key = entry.record.identity_key(),
        "Correction recorded and review entry resolved"
    );
    state.event_bus.emit(PipelineEvent::CorrectionRecorded {
        entry_id: entry.entry_id,
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(json!({
        "status": "recorded",
        "entryId": entry.entry_id,
    })))
}

/// Build review routes
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/review", get(list_review_entries))
        .route("/review/correction", post(submit_correction))
}
