//! Decision engine
//!
//! Applies the threshold matrix to a joined record and performs the
//! per-decision side effects: persist the final record, park undecided
//! records for manual review, deliver approved-lead alerts.
//!
//! The final-record insert is the idempotency gate. Only the call that
//! performs the insert owns the one-time side effects; a redelivered
//! dispatch for the same identity key persists nothing and alerts nobody.

use crate::config::DecisionPolicy;
use crate::contracts;
use crate::db;
use leadhunt_common::events::{EventBus, PipelineEvent};
use leadhunt_common::model::{Decision, EnrichedRecord, FinalRecord};
use leadhunt_common::Result;
use crate::services::AlertSink;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Apply the decision matrix to both scores.
///
/// Approval requires both scores strictly above the approve threshold;
/// either score strictly below the reject threshold rejects; everything
/// between goes to a human.
pub fn decide(policy: &DecisionPolicy, record: &EnrichedRecord) -> Decision {
    let confidence = record.verification.confidence_score;
    let quality = record.internal_qc.quality_score;

    if confidence > policy.approve_threshold && quality > policy.approve_threshold {
        Decision::Approved
    } else if confidence < policy.reject_threshold || quality < policy.reject_threshold {
        Decision::Rejected
    } else {
        Decision::ManualReview
    }
}

pub struct DecisionEngine {
    pool: SqlitePool,
    policy: DecisionPolicy,
    event_bus: EventBus,
    alerts: Option<Arc<dyn AlertSink>>,
}

impl DecisionEngine {
    pub fn new(
        pool: SqlitePool,
        policy: DecisionPolicy,
        event_bus: EventBus,
        alerts: Option<Arc<dyn AlertSink>>,
    ) -> Self {
        Self {
            pool,
            policy,
            event_bus,
            alerts,
        }
    }

    /// Decide one joined record and run the decision's side effects
    pub async fn dispatch(&self, enriched: EnrichedRecord) -> Result<FinalRecord> {
        contracts::validate(&enriched)?;

        let decision = decide(&self.policy, &enriched);
        let record = FinalRecord {
            enriched,
            decision,
            decided_at: chrono::Utc::now(),
        };

        let inserted = db::decisions::insert_final_record(&self.pool, &record).await?;
        if !inserted {
            tracing::info!(
                identity_key = record.identity_key(),
                "Final record already exists; duplicate dispatch ignored"
            );
            return Ok(record);
        }

        tracing::info!(
            identity_key = record.identity_key(),
            decision = ?decision,
            confidence_score = record.enriched.verification.confidence_score,
            quality_score = record.enriched.internal_qc.quality_score,
            partial = record.enriched.partial,
            "Decision made"
        );
        self.event_bus.emit(PipelineEvent::DecisionMade {
            identity_key: record.identity_key().to_string(),
            decision,
            timestamp: record.decided_at,
        });

        match decision {
            Decision::ManualReview => {
                if let Some(entry) = db::review::enqueue(&self.pool, &record).await? {
                    self.event_bus.emit(PipelineEvent::ReviewQueued {
                        identity_key: record.identity_key().to_string(),
                        entry_id: entry.entry_id,
                        timestamp: entry.queued_at,
                    });
                }
            }
            Decision::Approved => {
                if let Some(alerts) = &self.alerts {
                    // The record is already durable; an alert failure is
                    // logged rather than failing the dispatch, because a
                    // retry would hit the idempotency gate and never
                    // re-attempt delivery anyway.
                    if let Err(e) = alerts.deliver(&record).await {
                        tracing::error!(
                            identity_key = record.identity_key(),
                            error = %e,
                            "Approved-lead alert delivery failed"
                        );
                    }
                }
            }
            Decision::Rejected => {}
        }

        Ok(record)
    }
}
