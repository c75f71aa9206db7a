//! Internal QC branch (branch B)
//!
//! Runs the in-house business rules, a logical consistency check, and the
//! tone gate over an analysis, then folds the outcomes into a quality score.
//! Everything here is deterministic except the tone collaborator.
//!
//! Penalty weights: 10 points per failed business rule, 20 for a consistency
//! failure, 10 for a tone failure, floored at zero.

use crate::services::ToneAnalyzer;
use leadhunt_common::model::{AnalysisRecord, CheckOutcome, QcResult};
use leadhunt_common::Result;
use std::sync::Arc;

/// Number of business rules evaluated; rules_passed + rules_failed always
/// sums to this
pub const TOTAL_RULES: i64 = 3;

const RULE_PENALTY: i64 = 10;
const CONSISTENCY_PENALTY: i64 = 20;
const TONE_PENALTY: i64 = 10;

pub struct InternalQc {
    tone: Option<Arc<dyn ToneAnalyzer>>,
}

impl InternalQc {
    pub fn new(tone: Option<Arc<dyn ToneAnalyzer>>) -> Self {
        Self { tone }
    }

    /// Run the full QC pass for one analysis
    pub async fn verify(&self, analysis: &AnalysisRecord) -> Result<QcResult> {
        let failed_rules = business_rule_failures(analysis);
        let logical_consistency = logical_consistency(analysis);

        // Tone gate passes when no analyzer is configured
        let tone_analysis = match &self.tone {
            Some(tone) => tone.assess(analysis).await?,
            None => CheckOutcome::Passed,
        };

        let rules_failed = failed_rules.len() as i64;
        let quality_score = quality_score(rules_failed, logical_consistency, tone_analysis);

        tracing::info!(
            identity_key = analysis.identity_key(),
            quality_score,
            rules_failed,
            consistency_failed = logical_consistency.is_failed(),
            tone_failed = tone_analysis.is_failed(),
            "Internal QC complete"
        );

        Ok(QcResult {
            quality_score,
            rules_passed: TOTAL_RULES - rules_failed,
            rules_failed,
            failed_rules,
            logical_consistency,
            tone_analysis,
            checked_at: chrono::Utc::now(),
        })
    }
}

/// Evaluate the business rules; returns a description of each failure
pub fn business_rule_failures(analysis: &AnalysisRecord) -> Vec<String> {
    let mut failures = Vec::new();

    if analysis.opportunity_type == "New Construction"
        && !analysis
            .potential_need
            .iter()
            .any(|need| need == "Construction Services")
    {
        failures.push(
            "New Construction opportunities must list 'Construction Services' in potentialNeed"
                .to_string(),
        );
    }

    if analysis.industry == "Technology" && analysis.opportunity_score <= 7 {
        failures.push(
            "Technology opportunities must have an opportunityScore greater than 7".to_string(),
        );
    }

    if analysis.summary.chars().count() < 50 {
        failures.push("Summary must be at least 50 characters long".to_string());
    }

    failures
}

/// Cross-field sanity check: a summary describing an expansion contradicts a
/// Downsizing opportunity type
pub fn logical_consistency(analysis: &AnalysisRecord) -> CheckOutcome {
    if analysis.summary.to_lowercase().contains("expansion")
        && analysis.opportunity_type == "Downsizing"
    {
        CheckOutcome::Failed
    } else {
        CheckOutcome::Passed
    }
}

/// Fold check outcomes into a quality score in [0, 100]
pub fn quality_score(
    rules_failed: i64,
    consistency: CheckOutcome,
    tone: CheckOutcome,
) -> i64 {
    let mut score = 100 - RULE_PENALTY * rules_failed;
    if consistency.is_failed() {
        score -= CONSISTENCY_PENALTY;
    }
    if tone.is_failed() {
        score -= TONE_PENALTY;
    }
    score.max(0)
}
