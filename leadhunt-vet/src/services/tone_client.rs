//! Sentiment/tone analysis client
//!
//! The tone gate is delegated entirely to an external text-analysis service;
//! the pipeline only depends on its Passed/Failed contract.

use super::ToneAnalyzer;
use leadhunt_common::model::{AnalysisRecord, CheckOutcome};
use leadhunt_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct AssessResponse {
    outcome: CheckOutcome,
}

/// HTTP client for the tone analysis collaborator
pub struct HttpToneAnalyzer {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpToneAnalyzer {
    pub fn new(endpoint: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| Error::collaborator("tone", e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ToneAnalyzer for HttpToneAnalyzer {
    async fn assess(&self, record: &AnalysisRecord) -> Result<CheckOutcome> {
        let url = format!("{}/v1/assess", self.endpoint);
        let response = self
            .http_client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| Error::collaborator("tone", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::collaborator(
                "tone",
                format!("HTTP {} for {}", status, record.identity_key()),
            ));
        }

        let parsed: AssessResponse = response
            .json()
            .await
            .map_err(|e| Error::collaborator("tone", format!("malformed reply: {}", e)))?;

        Ok(parsed.outcome)
    }
}
