//! Wire contracts shared by every pipeline stage
//!
//! These types define the explicit data contracts between stages. Records are
//! carried forward by value: later stages only add fields, never mutate the
//! analysis produced by extraction. Field names on the wire follow the
//! upstream collector's JSON conventions (camelCase, `sourceURL`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw candidate document produced by the upstream content collector.
///
/// Immutable input to the extraction stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDocument {
    /// Cleaned article/document text
    pub text: String,
    /// Canonical URL of the source document
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    /// Hostname the document was collected from
    pub source_domain: String,
}

/// Structured business-opportunity analysis extracted by the generative model.
///
/// `source_url` is the identity key correlating this record with its two
/// verification branch outputs for the rest of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub company_name: String,
    pub industry: String,
    pub region: String,
    pub opportunity_type: String,
    pub summary: String,
    pub potential_need: Vec<String>,
    /// Integer score in [1, 10]
    pub opportunity_score: i64,
    pub key_quote: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
}

impl AnalysisRecord {
    /// Stable key correlating this record through fan-out and join
    pub fn identity_key(&self) -> &str {
        &self.source_url
    }
}

/// Outcome of a pass/fail gate (logical consistency, tone)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckOutcome {
    Passed,
    Failed,
}

impl CheckOutcome {
    pub fn is_failed(self) -> bool {
        self == CheckOutcome::Failed
    }
}

/// External fact-check output (verification branch A). One per AnalysisRecord.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Overall confidence in [0, 100]
    pub confidence_score: i64,
    /// Source reputation in [0, 100]
    pub source_reputation_score: i64,
    /// Number of independent corroborating sources found
    pub corroborating_sources: i64,
    pub corroborating_urls: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

impl VerificationResult {
    /// Conservative synthesized result for a branch that never reported.
    /// Lowest confidence, never a pass.
    pub fn degraded_default(now: DateTime<Utc>) -> Self {
        Self {
            confidence_score: 0,
            source_reputation_score: 0,
            corroborating_sources: 0,
            corroborating_urls: Vec::new(),
            checked_at: now,
        }
    }
}

/// Internal QC output (verification branch B). One per AnalysisRecord.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QcResult {
    /// Overall quality in [0, 100]
    pub quality_score: i64,
    pub rules_passed: i64,
    pub rules_failed: i64,
    pub failed_rules: Vec<String>,
    pub logical_consistency: CheckOutcome,
    pub tone_analysis: CheckOutcome,
    pub checked_at: DateTime<Utc>,
}

impl QcResult {
    /// Conservative synthesized result for a branch that never reported.
    pub fn degraded_default(now: DateTime<Utc>) -> Self {
        Self {
            quality_score: 0,
            rules_passed: 0,
            rules_failed: 1,
            failed_rules: vec!["internal QC did not report before the join deadline".to_string()],
            logical_consistency: CheckOutcome::Failed,
            tone_analysis: CheckOutcome::Failed,
            checked_at: now,
        }
    }
}

/// Analysis joined with both branch outputs for the same identity key.
///
/// Exists only after the join coordinator has both results (or has
/// synthesized a degraded default on the timeout path, flagged `partial`).
/// The decision engine must never evaluate anything less than this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub analysis: AnalysisRecord,
    pub verification: VerificationResult,
    pub internal_qc: QcResult,
    /// True when one branch was synthesized via the join-timeout path
    #[serde(default)]
    pub partial: bool,
}

impl EnrichedRecord {
    pub fn identity_key(&self) -> &str {
        self.analysis.identity_key()
    }
}

/// Final disposition of an enriched record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
    #[serde(rename = "Manual Review")]
    ManualReview,
}

/// Enriched record plus its decision. The unit delivered downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalRecord {
    #[serde(flatten)]
    pub enriched: EnrichedRecord,
    pub decision: Decision,
    pub decided_at: DateTime<Utc>,
}

impl FinalRecord {
    pub fn identity_key(&self) -> &str {
        self.enriched.identity_key()
    }
}

/// A FinalRecord parked for human review, with its durable queue id.
///
/// `entry_id` is deliberately distinct from the pipeline identity key so the
/// human-facing listing survives reprocessing of the same source URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualReviewEntry {
    pub entry_id: Uuid,
    #[serde(flatten)]
    pub record: FinalRecord,
    pub queued_at: DateTime<Utc>,
}

/// Human-corrected analysis referencing the review entry it resolves.
///
/// Append-only once written; consumed later as fine-tuning data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRecord {
    /// Review entry this correction resolves. Required.
    pub entry_id: Uuid,
    /// The corrected analysis, same shape as the model's output
    #[serde(flatten)]
    pub corrected: AnalysisRecord,
}
