//! Final record persistence
//!
//! Final records are keyed by the pipeline identity key. The first insert
//! wins; a redelivered dispatch for the same key is a no-op, which is what
//! keeps decision side effects idempotent under at-least-once delivery.

use chrono::{DateTime, Utc};
use leadhunt_common::model::{Decision, FinalRecord};
use leadhunt_common::Result;
use sqlx::{Row, SqlitePool};

/// Insert a final record unless one already exists for this identity key.
///
/// Returns true when this call performed the insert (the caller then owns
/// the one-time downstream side effects, e.g. the approved-lead alert).
pub async fn insert_final_record(pool: &SqlitePool, record: &FinalRecord) -> Result<bool> {
    let record_json = serde_json::to_string(record)
        .map_err(|e| leadhunt_common::Error::Internal(format!("serialize final record: {}", e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO final_records (identity_key, decision, record, decided_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(identity_key) DO NOTHING
        "#,
    )
    .bind(record.identity_key())
    .bind(decision_label(record.decision))
    .bind(&record_json)
    .bind(record.decided_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Load the final record for an identity key, if decided
pub async fn load_final_record(pool: &SqlitePool, identity_key: &str) -> Result<Option<FinalRecord>> {
    let row = sqlx::query("SELECT record FROM final_records WHERE identity_key = ?")
        .bind(identity_key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let json: String = row.get("record");
            let record = serde_json::from_str(&json).map_err(|e| {
                leadhunt_common::Error::Internal(format!("corrupt final record row: {}", e))
            })?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}

/// Count decided records since a timestamp (health/diagnostics)
pub async fn count_since(pool: &SqlitePool, since: DateTime<Utc>) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM final_records WHERE decided_at >= ?")
        .bind(since)
        .fetch_one(pool)
        .await?;
    Ok(row.get("n"))
}

fn decision_label(decision: Decision) -> &'static str {
    match decision {
        Decision::Approved => "Approved",
        Decision::Rejected => "Rejected",
        Decision::ManualReview => "Manual Review",
    }
}
