//! Append-only corrections dataset
//!
//! Human corrections are recorded here durably *before* the review entry is
//! removed, so a crash between the two steps can orphan a queue entry but
//! never lose a correction.

use chrono::{DateTime, Utc};
use leadhunt_common::model::CorrectionRecord;
use leadhunt_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Durably append a correction
pub async fn append(pool: &SqlitePool, correction: &CorrectionRecord) -> Result<()> {
    let corrected_json = serde_json::to_string(&correction.corrected)
        .map_err(|e| leadhunt_common::Error::Internal(format!("serialize correction: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO corrections (entry_id, corrected, submitted_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(correction.entry_id.to_string())
    .bind(&corrected_json)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// All corrections recorded for a review entry, oldest first
pub async fn list_for_entry(
    pool: &SqlitePool,
    entry_id: Uuid,
) -> Result<Vec<(CorrectionRecord, DateTime<Utc>)>> {
    let rows = sqlx::query(
        "SELECT entry_id, corrected, submitted_at FROM corrections WHERE entry_id = ? ORDER BY id",
    )
    .bind(entry_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let entry_id: String = row.get("entry_id");
            let corrected_json: String = row.get("corrected");
            let submitted_at: DateTime<Utc> = row.get("submitted_at");

            let entry_id = Uuid::parse_str(&entry_id).map_err(|e| {
                leadhunt_common::Error::Internal(format!("corrupt correction entry id: {}", e))
            })?;
            let corrected = serde_json::from_str(&corrected_json).map_err(|e| {
                leadhunt_common::Error::Internal(format!("corrupt correction row: {}", e))
            })?;

            Ok((
                CorrectionRecord {
                    entry_id,
                    corrected,
                },
                submitted_at,
            ))
        })
        .collect()
}

/// Total corrections recorded
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM corrections")
        .fetch_one(pool)
        .await?;
    Ok(row.get("n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use leadhunt_common::model::AnalysisRecord;

    fn sample_correction(entry_id: Uuid) -> CorrectionRecord {
        CorrectionRecord {
            entry_id,
            corrected: AnalysisRecord {
                company_name: "Acme Corporation".to_string(),
                industry: "Technology".to_string(),
                region: "EMEA".to_string(),
                opportunity_type: "Expansion".to_string(),
                summary: "Corrected summary with the proper legal entity name for the company."
                    .to_string(),
                potential_need: vec!["Cloud Migration".to_string()],
                opportunity_score: 8,
                key_quote: "We are doubling our footprint".to_string(),
                source_url: "https://news.example.com/acme".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn corrections_accumulate_append_only() {
        let pool = test_pool().await;
        let entry_id = Uuid::new_v4();

        append(&pool, &sample_correction(entry_id)).await.unwrap();
        append(&pool, &sample_correction(entry_id)).await.unwrap();

        assert_eq!(count(&pool).await.unwrap(), 2);
        let listed = list_for_entry(&pool, entry_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0.corrected.company_name, "Acme Corporation");
    }
}
