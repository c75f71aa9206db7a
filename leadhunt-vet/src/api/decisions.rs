//! Decided record lookup

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use leadhunt_common::model::FinalRecord;

/// GET /decisions/:identity_key
///
/// Look up the final record for an identity key. The key is a source URL, so
/// callers percent-encode it; axum decodes the path segment before it
/// arrives here.
pub async fn get_decision(
    State(state): State<AppState>,
    Path(identity_key): Path<String>,
) -> ApiResult<Json<FinalRecord>> {
    let record = db::decisions::load_final_record(&state.db, &identity_key)
        .await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("no decision for '{}'", identity_key)))?;
    Ok(Json(record))
}

/// Build decision lookup routes
pub fn decision_routes() -> Router<AppState> {
    Router::new().route("/decisions/:identity_key", get(get_decision))
}
