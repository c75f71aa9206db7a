//! External fact-check branch (branch A)
//!
//! Vets the source domain against the allow/deny lists and the reputation
//! service, pulls a handful of checkable facts out of the analysis, asks the
//! search collaborator for independent corroboration, and folds both into a
//! weighted confidence score.
//!
//! Never mutates the analysis. The output is a VerificationResult submitted
//! to the join coordinator under the analysis identity key.

use crate::config::VettingPolicy;
use crate::services::{CheckableFacts, Corroboration, ReputationService, SearchService};
use leadhunt_common::model::{AnalysisRecord, VerificationResult};
use leadhunt_common::{Error, Result};
use std::sync::Arc;

pub struct ExternalFactCheck {
    policy: VettingPolicy,
    reputation: Option<Arc<dyn ReputationService>>,
    search: Option<Arc<dyn SearchService>>,
}

impl ExternalFactCheck {
    pub fn new(
        policy: VettingPolicy,
        reputation: Option<Arc<dyn ReputationService>>,
        search: Option<Arc<dyn SearchService>>,
    ) -> Self {
        Self {
            policy,
            reputation,
            search,
        }
    }

    /// Run the full fact check for one analysis
    pub async fn verify(&self, analysis: &AnalysisRecord) -> Result<VerificationResult> {
        let domain = source_domain(analysis)?;
        let source_reputation_score = self.vet_source(&domain).await?;

        let facts = extract_checkable_facts(analysis);
        let corroboration = match &self.search {
            Some(search) => search.corroborate(&facts).await?,
            None => Corroboration::default(),
        };

        let confidence_score = self.confidence_score(source_reputation_score, corroboration.count);

        tracing::info!(
            identity_key = analysis.identity_key(),
            domain = %domain,
            source_reputation_score,
            corroborating_sources = corroboration.count,
            confidence_score,
            "External fact check complete"
        );

        Ok(VerificationResult {
            confidence_score,
            source_reputation_score,
            corroborating_sources: corroboration.count,
            corroborating_urls: corroboration.urls,
            checked_at: chrono::Utc::now(),
        })
    }

    /// Reputation of the source domain in [0, 100].
    ///
    /// The allow and deny lists are authoritative and short-circuit the
    /// reputation lookup. Unlisted domains consult the reputation service
    /// when one is configured, otherwise score the neutral default.
    async fn vet_source(&self, domain: &str) -> Result<i64> {
        if domain_listed(domain, &self.policy.domain_allow_list) {
            return Ok(100);
        }
        if domain_listed(domain, &self.policy.domain_deny_list) {
            return Ok(0);
        }
        match &self.reputation {
            Some(reputation) => reputation.domain_score(domain).await,
            None => Ok(self.policy.neutral_reputation),
        }
    }

    /// Weighted blend of reputation and (capped) corroboration, in [0, 100]
    fn confidence_score(&self, reputation: i64, corroborating_sources: i64) -> i64 {
        let capped = corroborating_sources
            .clamp(0, self.policy.corroboration_cap);
        let raw = self.policy.reputation_weight * reputation as f64
            + self.policy.corroboration_weight * capped as f64 * 10.0;
        (raw.round() as i64).clamp(0, 100)
    }
}

/// Hostname of the analysis source URL
fn source_domain(analysis: &AnalysisRecord) -> Result<String> {
    let parsed = url::Url::parse(&analysis.source_url).map_err(|e| {
        Error::contract(
            "analysis_record",
            vec![format!("sourceURL is not a valid URL: {}", e)],
        )
    })?;
    parsed
        .host_str()
        .map(|host| host.to_string())
        .ok_or_else(|| {
            Error::contract(
                "analysis_record",
                vec!["sourceURL has no host".to_string()],
            )
        })
}

/// Exact match, or a subdomain of a listed domain
fn domain_listed(domain: &str, list: &[String]) -> bool {
    list.iter()
        .any(|entry| domain == entry || domain.ends_with(&format!(".{}", entry)))
}

/// Pull the assertions worth triangulating out of an analysis
fn extract_checkable_facts(analysis: &AnalysisRecord) -> CheckableFacts {
    CheckableFacts {
        company_name: analysis.company_name.clone(),
        money_figure: first_money_figure(&analysis.summary),
        region: analysis.region.clone(),
    }
}

/// First "$<digits>M" figure in the text, if any
fn first_money_figure(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while let Some(offset) = text[i..].find('$') {
        let start = i + offset;
        let mut end = start + 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end > start + 1 && bytes.get(end) == Some(&b'M') {
            return Some(text[start..=end].to_string());
        }
        i = start + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadhunt_common::Error;

    struct FixedReputation(i64);

    #[async_trait::async_trait]
    impl ReputationService for FixedReputation {
        async fn domain_score(&self, _domain: &str) -> leadhunt_common::Result<i64> {
            Ok(self.0)
        }
    }

    struct FailingReputation;

    #[async_trait::async_trait]
    impl ReputationService for FailingReputation {
        async fn domain_score(&self, _domain: &str) -> leadhunt_common::Result<i64> {
            Err(Error::collaborator("reputation", "connection refused"))
        }
    }

    struct FixedSearch(Corroboration);

    #[async_trait::async_trait]
    impl SearchService for FixedSearch {
        async fn corroborate(
            &self,
            facts: &CheckableFacts,
        ) -> leadhunt_common::Result<Corroboration> {
            assert_eq!(facts.company_name, "Acme Corp");
            Ok(self.0.clone())
        }
    }

    fn analysis_from(source_url: &str) -> AnalysisRecord {
        AnalysisRecord {
            company_name: "Acme Corp".to_string(),
            industry: "Technology".to_string(),
            region: "EMEA".to_string(),
            opportunity_type: "Expansion".to_string(),
            summary: "Acme Corp announced a $40M expansion of its Frankfurt campus.".to_string(),
            potential_need: vec!["IT Infrastructure".to_string()],
            opportunity_score: 9,
            key_quote: "We are doubling our footprint".to_string(),
            source_url: source_url.to_string(),
        }
    }

    fn branch(
        reputation: Option<Arc<dyn ReputationService>>,
        search: Option<Arc<dyn SearchService>>,
    ) -> ExternalFactCheck {
        ExternalFactCheck::new(VettingPolicy::default(), reputation, search)
    }

    #[tokio::test]
    async fn allow_listed_domain_scores_full_reputation() {
        // The allow list beats even a configured reputation service
        let branch = branch(Some(Arc::new(FixedReputation(10))), None);
        let result = branch
            .verify(&analysis_from("https://www.reuters.com/business/acme"))
            .await
            .unwrap();
        assert_eq!(result.source_reputation_score, 100);
        // reputation 100, zero corroboration: 0.5*100 + 0.5*0*10
        assert_eq!(result.confidence_score, 50);
    }

    #[tokio::test]
    async fn deny_listed_domain_scores_zero() {
        let branch = branch(None, None);
        let result = branch
            .verify(&analysis_from("https://my-sensational-blog.net/scoop"))
            .await
            .unwrap();
        assert_eq!(result.source_reputation_score, 0);
        assert_eq!(result.confidence_score, 0);
    }

    #[tokio::test]
    async fn unlisted_domain_without_service_scores_neutral() {
        let branch = branch(None, None);
        let result = branch
            .verify(&analysis_from("https://news.example.com/acme"))
            .await
            .unwrap();
        assert_eq!(result.source_reputation_score, 85);
    }

    #[tokio::test]
    async fn corroboration_is_capped() {
        let branch = branch(
            None,
            Some(Arc::new(FixedSearch(Corroboration {
                count: 40,
                urls: vec![],
            }))),
        );
        let result = branch
            .verify(&analysis_from("https://news.example.com/acme"))
            .await
            .unwrap();
        // 0.5*85 + 0.5*min(40,10)*10 = 42.5 + 50 = 92.5 -> 93
        assert_eq!(result.corroborating_sources, 40);
        assert_eq!(result.confidence_score, 93);
    }

    #[tokio::test]
    async fn configured_reputation_failure_propagates() {
        let branch = branch(Some(Arc::new(FailingReputation)), None);
        let err = branch
            .verify(&analysis_from("https://news.example.com/acme"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Collaborator { .. }));
    }

    #[test]
    fn money_figure_extraction() {
        assert_eq!(
            first_money_figure("a $40M expansion with a $7M annex"),
            Some("$40M".to_string())
        );
        assert_eq!(first_money_figure("spent $40 million"), None);
        assert_eq!(first_money_figure("no figures here"), None);
        assert_eq!(first_money_figure("trailing dollar $"), None);
    }

    #[test]
    fn subdomains_match_listed_domains() {
        let list = vec!["reuters.com".to_string()];
        assert!(domain_listed("reuters.com", &list));
        assert!(domain_listed("www.reuters.com", &list));
        assert!(!domain_listed("notreuters.com", &list));
    }
}
