//! Media reputation service client
//!
//! Pure lookup: `(domain) -> score in [0, 100]`. The allow/deny short-circuit
//! lives in the source-vetting step, not here; this client is only consulted
//! for domains on neither list.

use super::ReputationService;
use leadhunt_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: i64,
}

/// HTTP client for the reputation collaborator
pub struct HttpReputationService {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpReputationService {
    pub fn new(endpoint: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| Error::collaborator("reputation", e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ReputationService for HttpReputationService {
    async fn domain_score(&self, domain: &str) -> Result<i64> {
        let url = format!("{}/v1/score", self.endpoint);
        let response = self
            .http_client
            .get(&url)
            .query(&[("domain", domain)])
            .send()
            .await
            .map_err(|e| Error::collaborator("reputation", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::collaborator(
                "reputation",
                format!("HTTP {} for domain {}", status, domain),
            ));
        }

        let parsed: ScoreResponse = response
            .json()
            .await
            .map_err(|e| Error::collaborator("reputation", format!("malformed reply: {}", e)))?;

        Ok(parsed.score.clamp(0, 100))
    }
}
