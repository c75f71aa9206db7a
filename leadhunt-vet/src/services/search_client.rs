//! Corroborating-source search client
//!
//! Pure lookup: `(facts) -> {count, urls}`. Slow or unavailable search
//! propagates as a branch failure; it is never silently defaulted.

use super::{CheckableFacts, Corroboration, SearchService};
use leadhunt_common::{Error, Result};
use std::time::Duration;

/// HTTP client for the search/triangulation collaborator
pub struct HttpSearchService {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpSearchService {
    pub fn new(endpoint: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::collaborator("search", e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl SearchService for HttpSearchService {
    async fn corroborate(&self, facts: &CheckableFacts) -> Result<Corroboration> {
        let url = format!("{}/v1/corroborate", self.endpoint);
        let response = self
            .http_client
            .post(&url)
            .json(facts)
            .send()
            .await
            .map_err(|e| Error::collaborator("search", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::collaborator(
                "search",
                format!("HTTP {} for company {}", status, facts.company_name),
            ));
        }

        let parsed: Corroboration = response
            .json()
            .await
            .map_err(|e| Error::collaborator("search", format!("malformed reply: {}", e)))?;

        Ok(parsed)
    }
}
