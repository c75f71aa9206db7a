//! Stage boundary contract validation
//!
//! One validator abstraction shared by every stage boundary, with a named
//! schema per record kind. Serde already guarantees field presence and types
//! at deserialization; these checks enforce the value constraints the wire
//! types cannot express (non-empty strings, valid URIs, score ranges).
//!
//! A contract violation is terminal for that message: it is logged and
//! dropped, never retried, since redelivery reproduces the same mismatch.

use leadhunt_common::model::{AnalysisRecord, CandidateDocument, EnrichedRecord};
use leadhunt_common::{Error, Result};
use url::Url;

/// A record kind validated at a stage boundary under a stable schema name
pub trait Contract {
    /// Schema name used in logs and violation errors
    const SCHEMA: &'static str;

    /// Append a violation message for every failed constraint
    fn check(&self, violations: &mut Vec<String>);
}

/// Validate a record against its named schema.
///
/// Pass-through on success; on failure returns a `ContractViolation` naming
/// every offending field. No partial side effects.
pub fn validate<T: Contract>(record: &T) -> Result<()> {
    let mut violations = Vec::new();
    record.check(&mut violations);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::contract(T::SCHEMA, violations))
    }
}

fn require_non_empty(field: &str, value: &str, violations: &mut Vec<String>) {
    if value.trim().is_empty() {
        violations.push(format!("'{}' must be a non-empty string", field));
    }
}

fn require_uri(field: &str, value: &str, violations: &mut Vec<String>) {
    match Url::parse(value) {
        Ok(url) if url.has_host() => {}
        _ => violations.push(format!("'{}' must be a valid absolute URI", field)),
    }
}

impl Contract for CandidateDocument {
    const SCHEMA: &'static str = "candidate_document";

    fn check(&self, violations: &mut Vec<String>) {
        require_non_empty("text", &self.text, violations);
        require_uri("sourceURL", &self.source_url, violations);
        require_non_empty("sourceDomain", &self.source_domain, violations);
    }
}

impl Contract for AnalysisRecord {
    const SCHEMA: &'static str = "analysis_record";

    fn check(&self, violations: &mut Vec<String>) {
        require_non_empty("companyName", &self.company_name, violations);
        require_non_empty("industry", &self.industry, violations);
        require_non_empty("region", &self.region, violations);
        require_non_empty("opportunityType", &self.opportunity_type, violations);
        require_non_empty("summary", &self.summary, violations);
        require_non_empty("keyQuote", &self.key_quote, violations);
        require_uri("sourceURL", &self.source_url, violations);

        if !(1..=10).contains(&self.opportunity_score) {
            violations.push(format!(
                "'opportunityScore' must be an integer in [1, 10], got {}",
                self.opportunity_score
            ));
        }
        if self.potential_need.iter().any(|n| n.trim().is_empty()) {
            violations.push("'potentialNeed' entries must be non-empty strings".to_string());
        }
    }
}

impl Contract for EnrichedRecord {
    const SCHEMA: &'static str = "enriched_record";

    fn check(&self, violations: &mut Vec<String>) {
        self.analysis.check(violations);

        if !(0..=100).contains(&self.verification.confidence_score) {
            violations.push(format!(
                "'verification.confidenceScore' must be in [0, 100], got {}",
                self.verification.confidence_score
            ));
        }
        if !(0..=100).contains(&self.verification.source_reputation_score) {
            violations.push(format!(
                "'verification.sourceReputationScore' must be in [0, 100], got {}",
                self.verification.source_reputation_score
            ));
        }
        for url in &self.verification.corroborating_urls {
            if Url::parse(url).is_err() {
                violations.push(format!(
                    "'verification.corroboratingUrls' contains invalid URI: {}",
                    url
                ));
            }
        }
        if !(0..=100).contains(&self.internal_qc.quality_score) {
            violations.push(format!(
                "'internal_qc.qualityScore' must be in [0, 100], got {}",
                self.internal_qc.quality_score
            ));
        }
        if self.internal_qc.rules_failed != self.internal_qc.failed_rules.len() as i64 {
            violations.push("'internal_qc.rulesFailed' disagrees with failedRules list".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leadhunt_common::model::{CheckOutcome, QcResult, VerificationResult};

    fn minimal_valid_analysis() -> AnalysisRecord {
        AnalysisRecord {
            company_name: "Acme Corp".to_string(),
            industry: "Technology".to_string(),
            region: "EMEA".to_string(),
            opportunity_type: "Expansion".to_string(),
            summary: "Acme Corp is expanding its Frankfurt operations with a $40M investment."
                .to_string(),
            potential_need: vec!["IT Infrastructure".to_string()],
            opportunity_score: 8,
            key_quote: "We are doubling our footprint".to_string(),
            source_url: "https://news.example.com/acme".to_string(),
        }
    }

    #[test]
    fn minimal_valid_document_passes() {
        let doc = CandidateDocument {
            text: "Some article body".to_string(),
            source_url: "https://news.example.com/acme".to_string(),
            source_domain: "news.example.com".to_string(),
        };
        assert!(validate(&doc).is_ok());
    }

    #[test]
    fn empty_text_names_the_offending_field() {
        let doc = CandidateDocument {
            text: "  ".to_string(),
            source_url: "https://news.example.com/acme".to_string(),
            source_domain: "news.example.com".to_string(),
        };
        let err = validate(&doc).unwrap_err();
        match err {
            leadhunt_common::Error::ContractViolation { schema, violations } => {
                assert_eq!(schema, "candidate_document");
                assert!(violations.iter().any(|v| v.contains("'text'")));
            }
            other => panic!("expected contract violation, got {other}"),
        }
    }

    #[test]
    fn minimal_valid_analysis_passes() {
        assert!(validate(&minimal_valid_analysis()).is_ok());
    }

    #[test]
    fn opportunity_score_out_of_range_is_rejected() {
        for score in [0, 11, -3] {
            let mut record = minimal_valid_analysis();
            record.opportunity_score = score;
            let err = validate(&record).unwrap_err();
            assert!(err.to_string().contains("opportunityScore"), "score {score}");
        }
    }

    #[test]
    fn relative_source_url_is_rejected() {
        let mut record = minimal_valid_analysis();
        record.source_url = "not-a-uri".to_string();
        let err = validate(&record).unwrap_err();
        assert!(err.to_string().contains("sourceURL"));
    }

    #[test]
    fn all_violations_are_reported_together() {
        let mut record = minimal_valid_analysis();
        record.company_name = String::new();
        record.opportunity_score = 0;
        match validate(&record).unwrap_err() {
            leadhunt_common::Error::ContractViolation { violations, .. } => {
                assert_eq!(violations.len(), 2);
            }
            other => panic!("expected contract violation, got {other}"),
        }
    }

    #[test]
    fn enriched_record_rules_count_mismatch_is_rejected() {
        let now = Utc::now();
        let enriched = EnrichedRecord {
            analysis: minimal_valid_analysis(),
            verification: VerificationResult {
                confidence_score: 80,
                source_reputation_score: 85,
                corroborating_sources: 3,
                corroborating_urls: vec!["https://corroborating.example.com/a".to_string()],
                checked_at: now,
            },
            internal_qc: QcResult {
                quality_score: 90,
                rules_passed: 2,
                rules_failed: 1,
                failed_rules: vec![],
                logical_consistency: CheckOutcome::Passed,
                tone_analysis: CheckOutcome::Passed,
                checked_at: now,
            },
            partial: false,
        };
        let err = validate(&enriched).unwrap_err();
        assert!(err.to_string().contains("rulesFailed"));
    }
}
