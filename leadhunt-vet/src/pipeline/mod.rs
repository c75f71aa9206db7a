//! The staged vetting pipeline
//!
//! One candidate document flows extraction -> parallel verification branches
//! -> join -> decision. Stages communicate only through explicit records and
//! the durable join table, never shared mutable state, so any step can be
//! redelivered without corrupting another candidate's run.

pub mod decision;
pub mod external_check;
pub mod extraction;
pub mod internal_qc;
pub mod join;

pub use decision::{decide, DecisionEngine};
pub use external_check::ExternalFactCheck;
pub use extraction::ExtractionStage;
pub use internal_qc::InternalQc;
pub use join::JoinCoordinator;

use crate::config::VetConfig;
use crate::services::Collaborators;
use leadhunt_common::events::{BranchKind, EventBus, PipelineEvent};
use leadhunt_common::model::{CandidateDocument, FinalRecord};
use leadhunt_common::Result;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// All pipeline stages wired together over one database pool and event bus
pub struct Pipeline {
    extraction: ExtractionStage,
    external_check: ExternalFactCheck,
    internal_qc: InternalQc,
    join: JoinCoordinator,
    decision: DecisionEngine,
    event_bus: EventBus,
    sweep_interval: Duration,
}

impl Pipeline {
    pub fn new(
        pool: SqlitePool,
        config: &VetConfig,
        collaborators: Collaborators,
        event_bus: EventBus,
    ) -> Self {
        let extraction = ExtractionStage::new(
            collaborators.model.clone(),
            config.model.prompt_template_path.as_ref().map(PathBuf::from),
        );
        let external_check = ExternalFactCheck::new(
            config.vetting.clone(),
            collaborators.reputation.clone(),
            collaborators.search.clone(),
        );
        let internal_qc = InternalQc::new(collaborators.tone.clone());
        let join = JoinCoordinator::new(pool.clone(), config.join);
        let decision = DecisionEngine::new(
            pool,
            config.decision,
            event_bus.clone(),
            collaborators.alerts.clone(),
        );

        Self {
            extraction,
            external_check,
            internal_qc,
            join,
            decision,
            event_bus,
            sweep_interval: Duration::from_secs(config.join.sweep_interval_secs),
        }
    }

    /// Run one candidate document through the whole pipeline.
    ///
    /// Returns the final record when this run completed the join and won the
    /// dispatch, or None when the other result is still outstanding (a branch
    /// failed and the join deadline will release the key later, or a
    /// concurrent redelivery dispatched first).
    pub async fn process_document(&self, document: CandidateDocument) -> Result<Option<FinalRecord>> {
        let analysis = self.extraction.extract(&document).await?;
        let identity_key = analysis.identity_key().to_string();

        // Fan-out must be durable before either branch reports, or the
        // timeout sweep could never see a half-reported key.
        self.join.register_fanout(&analysis).await?;
        self.event_bus.emit(PipelineEvent::ExtractionComplete {
            identity_key: identity_key.clone(),
            company_name: analysis.company_name.clone(),
            timestamp: chrono::Utc::now(),
        });

        let (verification, qc) = tokio::join!(
            self.external_check.verify(&analysis),
            self.internal_qc.verify(&analysis),
        );

        // A single failed branch is not fatal to the candidate: the other
        // branch's result is stored and the join deadline covers the gap.
        // Both failing means nothing was stored, so propagate for retry.
        if let (Err(verification_err), Err(qc_err)) = (&verification, &qc) {
            tracing::error!(
                identity_key = %identity_key,
                verification_error = %verification_err,
                qc_error = %qc_err,
                "Both verification branches failed"
            );
            return Err(qc.unwrap_err());
        }

        let mut dispatched = None;

        match verification {
            Ok(result) => {
                self.event_bus.emit(PipelineEvent::BranchCompleted {
                    identity_key: identity_key.clone(),
                    branch: BranchKind::ExternalFactCheck,
                    score: result.confidence_score,
                    timestamp: chrono::Utc::now(),
                });
                if let Some(enriched) = self.join.submit_verification(&identity_key, &result).await? {
                    dispatched = Some(enriched);
                }
            }
            Err(e) => {
                tracing::warn!(
                    identity_key = %identity_key,
                    error = %e,
                    "External fact check failed; join deadline will cover this branch"
                );
            }
        }

        match qc {
            Ok(result) => {
                self.event_bus.emit(PipelineEvent::BranchCompleted {
                    identity_key: identity_key.clone(),
                    branch: BranchKind::InternalQc,
                    score: result.quality_score,
                    timestamp: chrono::Utc::now(),
                });
                if let Some(enriched) = self.join.submit_qc(&identity_key, &result).await? {
                    dispatched = Some(enriched);
                }
            }
            Err(e) => {
                tracing::warn!(
                    identity_key = %identity_key,
                    error = %e,
                    "Internal QC failed; join deadline will cover this branch"
                );
            }
        }

        match dispatched {
            Some(enriched) => {
                self.event_bus.emit(PipelineEvent::JoinCompleted {
                    identity_key: identity_key.clone(),
                    partial: enriched.partial,
                    timestamp: chrono::Utc::now(),
                });
                let record = self.decision.dispatch(enriched).await?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// One pass of the timeout sweep: release stale keys with degraded
    /// defaults, decide them, and purge expired dedup rows. Returns the
    /// number of keys released.
    pub async fn sweep_once(&self) -> Result<usize> {
        let now = chrono::Utc::now();
        let released = self.join.sweep_timeouts(now).await?;
        let count = released.len();

        for enriched in released {
            self.event_bus.emit(PipelineEvent::JoinCompleted {
                identity_key: enriched.identity_key().to_string(),
                partial: true,
                timestamp: now,
            });
            if let Err(e) = self.decision.dispatch(enriched).await {
                tracing::error!(error = %e, "Failed to decide a timed-out candidate");
            }
        }

        self.join.purge_dispatched(now).await?;
        Ok(count)
    }

    /// Spawn the periodic sweep task. Runs until the process exits.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(pipeline.sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = pipeline.sweep_once().await {
                    tracing::error!(error = %e, "Join timeout sweep failed");
                }
            }
        })
    }

    /// Keys still awaiting a branch result (health/diagnostics)
    pub async fn pending_joins(&self) -> Result<i64> {
        self.join.pending_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::services::*;
    use leadhunt_common::model::{CheckOutcome, Decision};
    use leadhunt_common::Error;

    struct CannedModel(String);

    #[async_trait::async_trait]
    impl GenerativeModel for CannedModel {
        async fn generate(&self, _prompt: &str) -> leadhunt_common::Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingSearch;

    #[async_trait::async_trait]
    impl SearchService for FailingSearch {
        async fn corroborate(
            &self,
            _facts: &CheckableFacts,
        ) -> leadhunt_common::Result<Corroboration> {
            Err(Error::collaborator("search", "timeout"))
        }
    }

    fn model_reply(score: i64) -> String {
        serde_json::json!({
            "companyName": "Acme Corp",
            "industry": "Manufacturing",
            "region": "EMEA",
            "opportunityType": "Expansion",
            "summary": "Acme Corp announced a $40M expansion of its Frankfurt data center campus.",
            "potentialNeed": ["IT Infrastructure"],
            "opportunityScore": score,
            "keyQuote": "We are doubling our footprint",
            "sourceURL": "https://www.reuters.com/business/acme"
        })
        .to_string()
    }

    fn document() -> CandidateDocument {
        CandidateDocument {
            text: "Acme Corp announced a $40M expansion.".to_string(),
            source_url: "https://www.reuters.com/business/acme".to_string(),
            source_domain: "www.reuters.com".to_string(),
        }
    }

    fn collaborators(
        model: Arc<dyn GenerativeModel>,
        search: Option<Arc<dyn SearchService>>,
    ) -> Collaborators {
        Collaborators {
            model,
            reputation: None,
            search,
            tone: None,
            alerts: None,
        }
    }

    struct TenCorroborations;

    #[async_trait::async_trait]
    impl SearchService for TenCorroborations {
        async fn corroborate(
            &self,
            _facts: &CheckableFacts,
        ) -> leadhunt_common::Result<Corroboration> {
            Ok(Corroboration {
                count: 10,
                urls: vec!["https://corroborating.example.com/a".to_string()],
            })
        }
    }

    #[tokio::test]
    async fn end_to_end_approval() {
        let pool = test_pool().await;
        // Allow-listed source (reputation 100) with full corroboration:
        // confidence 0.5*100 + 0.5*10*10 = 100. Clean record: quality 100.
        let pipeline = Pipeline::new(
            pool,
            &VetConfig::default(),
            collaborators(
                Arc::new(CannedModel(model_reply(9))),
                Some(Arc::new(TenCorroborations)),
            ),
            EventBus::new(32),
        );

        let record = pipeline
            .process_document(document())
            .await
            .unwrap()
            .expect("single run completes the join");
        assert_eq!(record.decision, Decision::Approved);
        assert!(!record.enriched.partial);
        assert_eq!(record.enriched.verification.confidence_score, 100);
        assert_eq!(record.enriched.internal_qc.quality_score, 100);
    }

    #[tokio::test]
    async fn reprocessing_the_same_document_changes_nothing() {
        let pool = test_pool().await;
        let pipeline = Pipeline::new(
            pool.clone(),
            &VetConfig::default(),
            collaborators(Arc::new(CannedModel(model_reply(9))), None),
            EventBus::new(32),
        );

        let first = pipeline.process_document(document()).await.unwrap();
        assert!(first.is_some());

        // Redelivery: join slots are already filled, nothing dispatches twice
        let second = pipeline.process_document(document()).await.unwrap();
        assert!(second.is_none());

        let stored = crate::db::decisions::load_final_record(
            &pool,
            "https://www.reuters.com/business/acme",
        )
        .await
        .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn failed_branch_leaves_key_for_the_sweep() {
        let pool = test_pool().await;
        let mut config = VetConfig::default();
        config.join.deadline_secs = 0; // deadline already elapsed

        let pipeline = Pipeline::new(
            pool,
            &config,
            collaborators(
                Arc::new(CannedModel(model_reply(9))),
                Some(Arc::new(FailingSearch)),
            ),
            EventBus::new(32),
        );

        // Branch A fails (configured search collaborator down); branch B
        // stores its result and the run reports no dispatch.
        let outcome = pipeline.process_document(document()).await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(pipeline.pending_joins().await.unwrap(), 1);

        // The sweep synthesizes the missing branch and decides the record.
        // Degraded verification scores zero confidence: rejected, partial.
        let released = pipeline.sweep_once().await.unwrap();
        assert_eq!(released, 1);
        assert_eq!(pipeline.pending_joins().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn events_cover_every_stage() {
        let pool = test_pool().await;
        let bus = EventBus::new(32);
        let mut rx = bus.subscribe();
        let pipeline = Pipeline::new(
            pool,
            &VetConfig::default(),
            collaborators(Arc::new(CannedModel(model_reply(9))), None),
            bus,
        );

        pipeline.process_document(document()).await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event.event_type());
        }
        assert_eq!(
            seen,
            vec![
                "extraction_complete",
                "branch_completed",
                "branch_completed",
                "join_completed",
                "decision_made",
            ]
        );
    }
}
