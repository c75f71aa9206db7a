//! Join coordinator: fan-in of the two verification branches
//!
//! Correlates VerificationResult and QcResult for the same identity key and
//! releases exactly one EnrichedRecord per candidate to the decision engine.
//!
//! State per in-flight candidate lives in the `join_state` table, never in
//! process memory: `awaiting_both → awaiting_one → complete → dispatched`.
//! Every transition is a conditional UPDATE, so two concurrent deliveries can
//! never both believe they are "the second" result. A dispatched row is kept
//! as the dedup record for late or redelivered branch results and purged
//! after a retention window.
//!
//! Keys that sit past the configured deadline with a branch missing are
//! claimed by the timeout sweep: the missing branch is synthesized as a
//! conservative failure (never a pass) and the record is released flagged
//! `partial`, so the pipeline makes forward progress instead of leaking
//! correlation state forever.

use crate::config::JoinConfig;
use chrono::{DateTime, Duration, Utc};
use leadhunt_common::model::{AnalysisRecord, EnrichedRecord, QcResult, VerificationResult};
use leadhunt_common::{Error, Result};
use sqlx::{Row, SqlitePool};

/// Which branch slot a submitted result fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchSlot {
    Verification,
    InternalQc,
}

impl BranchSlot {
    fn column(self) -> &'static str {
        match self {
            BranchSlot::Verification => "verification",
            BranchSlot::InternalQc => "internal_qc",
        }
    }

    fn sibling(self) -> &'static str {
        match self {
            BranchSlot::Verification => "internal_qc",
            BranchSlot::InternalQc => "verification",
        }
    }
}

/// Durable fan-in coordinator over the `join_state` table
#[derive(Clone)]
pub struct JoinCoordinator {
    pool: SqlitePool,
    config: JoinConfig,
}

impl JoinCoordinator {
    pub fn new(pool: SqlitePool, config: JoinConfig) -> Self {
        Self { pool, config }
    }

    /// Record that a fan-out was initiated for this analysis.
    ///
    /// Must happen before either branch runs: the sweep can only detect a
    /// missing branch for keys it knows were fanned out. Redelivery of the
    /// same document is a no-op (the existing row, whatever its state, wins).
    pub async fn register_fanout(&self, analysis: &AnalysisRecord) -> Result<()> {
        let analysis_json = serde_json::to_string(analysis)
            .map_err(|e| Error::Internal(format!("serialize analysis: {}", e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO join_state (identity_key, analysis, state, fan_out_started_at)
            VALUES (?, ?, 'awaiting_both', ?)
            ON CONFLICT(identity_key) DO NOTHING
            "#,
        )
        .bind(analysis.identity_key())
        .bind(&analysis_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                identity_key = analysis.identity_key(),
                "Fan-out already registered for this key"
            );
        }
        Ok(())
    }

    /// Submit branch A's result. Returns the enriched record if this
    /// submission completed the join and won the dispatch claim.
    pub async fn submit_verification(
        &self,
        identity_key: &str,
        result: &VerificationResult,
    ) -> Result<Option<EnrichedRecord>> {
        let json = serde_json::to_string(result)
            .map_err(|e| Error::Internal(format!("serialize verification result: {}", e)))?;
        self.submit(identity_key, BranchSlot::Verification, &json)
            .await
    }

    /// Submit branch B's result. Same contract as `submit_verification`.
    pub async fn submit_qc(
        &self,
        identity_key: &str,
        result: &QcResult,
    ) -> Result<Option<EnrichedRecord>> {
        let json = serde_json::to_string(result)
            .map_err(|e| Error::Internal(format!("serialize QC result: {}", e)))?;
        self.submit(identity_key, BranchSlot::InternalQc, &json).await
    }

    /// Store a branch result and advance the state machine.
    ///
    /// The UPDATE only fires while the branch slot is empty and the row is
    /// still awaiting: a duplicate delivery, or a late sibling arriving after
    /// the timeout sweep already dispatched the key, affects zero rows and is
    /// a logged no-op.
    async fn submit(
        &self,
        identity_key: &str,
        slot: BranchSlot,
        result_json: &str,
    ) -> Result<Option<EnrichedRecord>> {
        let sql = format!(
            r#"
            UPDATE join_state
            SET {slot} = ?,
                state = CASE WHEN {sibling} IS NULL THEN 'awaiting_one' ELSE 'complete' END
            WHERE identity_key = ?
              AND {slot} IS NULL
              AND state IN ('awaiting_both', 'awaiting_one')
            "#,
            slot = slot.column(),
            sibling = slot.sibling(),
        );

        let result = sqlx::query(&sql)
            .bind(result_json)
            .bind(identity_key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                identity_key,
                branch = slot.column(),
                "Duplicate or late branch result discarded"
            );
            return Ok(None);
        }

        self.try_claim_dispatch(identity_key).await
    }

    /// Claim the `complete → dispatched` transition.
    ///
    /// Exactly one concurrent caller can win this compare-and-set; the winner
    /// owns forwarding to the decision engine. The dispatched marker is
    /// persisted before this returns, so a crash afterwards cannot cause a
    /// second dispatch on redelivery.
    async fn try_claim_dispatch(&self, identity_key: &str) -> Result<Option<EnrichedRecord>> {
        let claimed = sqlx::query(
            r#"
            UPDATE join_state
            SET state = 'dispatched', dispatched_at = ?
            WHERE identity_key = ? AND state = 'complete'
            "#,
        )
        .bind(Utc::now())
        .bind(identity_key)
        .execute(&self.pool)
        .await?;

        if claimed.rows_affected() == 0 {
            return Ok(None);
        }

        let enriched = self.load_enriched(identity_key, false).await?;
        Ok(Some(enriched))
    }

    /// Claim and release every key that has waited past the join deadline.
    ///
    /// Missing branch results are synthesized as conservative failures and
    /// the records come back flagged `partial`. Each key is claimed with its
    /// own compare-and-set, so a branch result landing mid-sweep either beats
    /// the claim (and dispatches normally) or loses it (and is discarded).
    pub async fn sweep_timeouts(&self, now: DateTime<Utc>) -> Result<Vec<EnrichedRecord>> {
        let cutoff = now - Duration::seconds(self.config.deadline_secs as i64);

        let stale: Vec<String> = sqlx::query(
            r#"
            SELECT identity_key FROM join_state
            WHERE state IN ('awaiting_both', 'awaiting_one')
              AND fan_out_started_at <= ?
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| row.get("identity_key"))
        .collect();

        let mut released = Vec::new();
        for identity_key in stale {
            let claimed = sqlx::query(
                r#"
                UPDATE join_state
                SET state = 'dispatched', timed_out = 1, dispatched_at = ?
                WHERE identity_key = ?
                  AND state IN ('awaiting_both', 'awaiting_one')
                  AND fan_out_started_at <= ?
                "#,
            )
            .bind(now)
            .bind(&identity_key)
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

            if claimed.rows_affected() == 0 {
                continue; // a branch result won the race; normal dispatch happened
            }

            tracing::warn!(
                identity_key = %identity_key,
                deadline_secs = self.config.deadline_secs,
                "Join deadline elapsed; dispatching with degraded default"
            );
            released.push(self.load_enriched(&identity_key, true).await?);
        }

        Ok(released)
    }

    /// Purge dispatched dedup rows older than the retention window
    pub async fn purge_dispatched(&self, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = now - Duration::seconds(self.config.dispatched_retention_secs as i64);

        let result = sqlx::query(
            "DELETE FROM join_state WHERE state = 'dispatched' AND dispatched_at <= ?",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            tracing::debug!(purged, "Purged dispatched join rows past retention");
        }
        Ok(purged)
    }

    /// Count of keys still awaiting a branch (diagnostics)
    pub async fn pending_count(&self) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM join_state WHERE state IN ('awaiting_both', 'awaiting_one')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("n"))
    }

    /// Build the EnrichedRecord from a dispatched row, synthesizing degraded
    /// defaults for any branch that never reported (timeout path only).
    async fn load_enriched(&self, identity_key: &str, partial: bool) -> Result<EnrichedRecord> {
        let row = sqlx::query(
            "SELECT analysis, verification, internal_qc FROM join_state WHERE identity_key = ?",
        )
        .bind(identity_key)
        .fetch_one(&self.pool)
        .await?;

        let analysis_json: String = row.get("analysis");
        let verification_json: Option<String> = row.get("verification");
        let qc_json: Option<String> = row.get("internal_qc");

        let analysis: AnalysisRecord = serde_json::from_str(&analysis_json)
            .map_err(|e| Error::Internal(format!("corrupt join row (analysis): {}", e)))?;

        let now = Utc::now();
        let verification = match verification_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| Error::Internal(format!("corrupt join row (verification): {}", e)))?,
            None => VerificationResult::degraded_default(now),
        };
        let internal_qc = match qc_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| Error::Internal(format!("corrupt join row (internal_qc): {}", e)))?,
            None => QcResult::degraded_default(now),
        };

        Ok(EnrichedRecord {
            analysis,
            verification,
            internal_qc,
            partial,
        })
    }
}
