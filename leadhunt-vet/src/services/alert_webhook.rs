//! Approved-lead webhook delivery
//!
//! Posts a compact JSON payload for each approved lead to a configured
//! webhook. Rich chat formatting is the receiver's concern; this sink only
//! ships the fields a notification needs. Fires at most once per identity
//! key because the decision engine gates delivery on the first insert of the
//! final record.

use super::AlertSink;
use leadhunt_common::model::FinalRecord;
use leadhunt_common::{Error, Result};
use serde_json::json;
use std::time::Duration;

/// Webhook-backed alert sink for approved leads
pub struct WebhookAlertSink {
    http_client: reqwest::Client,
    webhook_url: String,
}

impl WebhookAlertSink {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| Error::collaborator("alert", e.to_string()))?;

        Ok(Self {
            http_client,
            webhook_url: webhook_url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl AlertSink for WebhookAlertSink {
    async fn deliver(&self, record: &FinalRecord) -> Result<()> {
        let analysis = &record.enriched.analysis;
        let payload = json!({
            "text": format!("New opportunity approved: {}", analysis.company_name),
            "companyName": analysis.company_name,
            "industry": analysis.industry,
            "region": analysis.region,
            "summary": analysis.summary,
            "potentialNeed": analysis.potential_need,
            "confidenceScore": record.enriched.verification.confidence_score,
            "qualityScore": record.enriched.internal_qc.quality_score,
            "sourceURL": analysis.source_url,
        });

        let response = self
            .http_client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::collaborator("alert", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::collaborator(
                "alert",
                format!("webhook returned HTTP {}", status),
            ));
        }

        tracing::info!(
            company = %analysis.company_name,
            "Delivered approved-lead alert"
        );
        Ok(())
    }
}
