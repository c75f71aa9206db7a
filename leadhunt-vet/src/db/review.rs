//! Durable manual review queue
//!
//! The store backing `GET /review`. Entries are keyed two ways: the unique
//! identity key guards against double-queueing a reprocessed candidate, and
//! the entry id gives humans a stable reference that survives reprocessing.

use chrono::Utc;
use leadhunt_common::model::{FinalRecord, ManualReviewEntry};
use leadhunt_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Park a final record for human review.
///
/// Returns the created entry, or None when this identity key is already
/// queued (redelivered dispatch), in which case nothing changes.
pub async fn enqueue(pool: &SqlitePool, record: &FinalRecord) -> Result<Option<ManualReviewEntry>> {
    let entry_id = Uuid::new_v4();
    let queued_at = Utc::now();
    let record_json = serde_json::to_string(record)
        .map_err(|e| leadhunt_common::Error::Internal(format!("serialize review entry: {}", e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO manual_review_queue (entry_id, identity_key, record, queued_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(identity_key) DO NOTHING
        "#,
    )
    .bind(entry_id.to_string())
    .bind(record.identity_key())
    .bind(&record_json)
    .bind(queued_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::debug!(
            identity_key = record.identity_key(),
            "Review entry already queued; duplicate dispatch ignored"
        );
        return Ok(None);
    }

    Ok(Some(ManualReviewEntry {
        entry_id,
        record: record.clone(),
        queued_at,
    }))
}

/// List all pending review entries. Empty store returns an empty list.
pub async fn list(pool: &SqlitePool) -> Result<Vec<ManualReviewEntry>> {
    let rows = sqlx::query(
        "SELECT entry_id, record, queued_at FROM manual_review_queue ORDER BY queued_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_entry).collect()
}

/// Look up one review entry by its id
pub async fn find(pool: &SqlitePool, entry_id: Uuid) -> Result<Option<ManualReviewEntry>> {
    let row = sqlx::query(
        "SELECT entry_id, record, queued_at FROM manual_review_queue WHERE entry_id = ?",
    )
    .bind(entry_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(row_to_entry).transpose()
}

/// Remove a resolved entry. Returns false when it was already gone.
pub async fn remove(pool: &SqlitePool, entry_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM manual_review_queue WHERE entry_id = ?")
        .bind(entry_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

fn row_to_entry(row: sqlx::sqlite::SqliteRow) -> Result<ManualReviewEntry> {
    let entry_id: String = row.get("entry_id");
    let record_json: String = row.get("record");
    let queued_at: chrono::DateTime<Utc> = row.get("queued_at");

    let entry_id = Uuid::parse_str(&entry_id)
        .map_err(|e| leadhunt_common::Error::Internal(format!("corrupt entry id: {}", e)))?;
    let record: FinalRecord = serde_json::from_str(&record_json)
        .map_err(|e| leadhunt_common::Error::Internal(format!("corrupt review entry: {}", e)))?;

    Ok(ManualReviewEntry {
        entry_id,
        record,
        queued_at,
    })
}
