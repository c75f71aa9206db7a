//! Generative model service client
//!
//! Thin HTTP client over the text-in/JSON-out model service. The service is
//! opaque to the pipeline: it takes a composed prompt string and returns a
//! reply expected to parse as an AnalysisRecord. Requests are rate limited so
//! a burst of inbound documents cannot overrun the model service quota.

use super::GenerativeModel;
use crate::config::ModelConfig;
use leadhunt_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const USER_AGENT: &str = concat!("leadhunt-vet/", env!("CARGO_PKG_VERSION"));

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting model call: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
}

/// HTTP client for the generative model collaborator
pub struct HttpGenerativeModel {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    rate_limiter: Arc<RateLimiter>,
}

impl HttpGenerativeModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::collaborator("model", e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit_ms)),
        })
    }
}

#[async_trait::async_trait]
impl GenerativeModel for HttpGenerativeModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.rate_limiter.wait().await;

        let url = format!("{}/v1/generate", self.endpoint);
        let response = self
            .http_client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
            })
            .send()
            .await
            .map_err(|e| Error::collaborator("model", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::collaborator(
                "model",
                format!("HTTP {}: {}", status, body),
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::collaborator("model", format!("malformed reply: {}", e)))?;

        tracing::debug!(reply_len = parsed.text.len(), "Model reply received");
        Ok(parsed.text)
    }
}
