//! External collaborator interfaces
//!
//! Every outbound dependency of the pipeline sits behind one of these narrow
//! traits: the generative model, the reputation and search lookups, the tone
//! gate, and the approved-lead alert sink. Stage code depends only on the
//! traits; tests substitute stubs.
//!
//! Collaborator failures are retryable (`Error::Collaborator`) and propagate
//! as stage failures rather than being silently defaulted.

pub mod alert_webhook;
pub mod model_client;
pub mod reputation_client;
pub mod search_client;
pub mod tone_client;

pub use alert_webhook::WebhookAlertSink;
pub use model_client::HttpGenerativeModel;
pub use reputation_client::HttpReputationService;
pub use search_client::HttpSearchService;
pub use tone_client::HttpToneAnalyzer;

use crate::config::VetConfig;
use leadhunt_common::model::{AnalysisRecord, CheckOutcome, FinalRecord};
use leadhunt_common::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Small set of checkable assertions pulled from an analysis for triangulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckableFacts {
    pub company_name: String,
    /// First money figure found in the summary (e.g. "$40M"), if any
    pub money_figure: Option<String>,
    pub region: String,
}

/// Independent corroboration found for a set of facts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corroboration {
    pub count: i64,
    pub urls: Vec<String>,
}

/// Opaque text-in/JSON-out generative model service
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Run the composed prompt; returns the model's raw textual reply
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Media reputation lookup, `(domain) -> score in [0, 100]`
#[async_trait::async_trait]
pub trait ReputationService: Send + Sync {
    async fn domain_score(&self, domain: &str) -> Result<i64>;
}

/// Corroborating-source search, `(facts) -> {count, urls}`
#[async_trait::async_trait]
pub trait SearchService: Send + Sync {
    async fn corroborate(&self, facts: &CheckableFacts) -> Result<Corroboration>;
}

/// Sentiment/tone gate over an analysis record
#[async_trait::async_trait]
pub trait ToneAnalyzer: Send + Sync {
    async fn assess(&self, record: &AnalysisRecord) -> Result<CheckOutcome>;
}

/// Delivery sink for approved leads
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, record: &FinalRecord) -> Result<()>;
}

/// The full set of collaborators wired into the pipeline.
///
/// Optional collaborators are unconfigured deployments, not failures: a
/// missing reputation service means unlisted domains score the configured
/// neutral default, a missing search service means zero corroboration, a
/// missing tone service passes the gate, and a missing alert sink skips
/// delivery. A *configured* collaborator that fails still propagates.
#[derive(Clone)]
pub struct Collaborators {
    pub model: Arc<dyn GenerativeModel>,
    pub reputation: Option<Arc<dyn ReputationService>>,
    pub search: Option<Arc<dyn SearchService>>,
    pub tone: Option<Arc<dyn ToneAnalyzer>>,
    pub alerts: Option<Arc<dyn AlertSink>>,
}

impl Collaborators {
    /// Build HTTP-backed collaborators from configuration
    pub fn from_config(config: &VetConfig) -> Result<Self> {
        let model: Arc<dyn GenerativeModel> = Arc::new(HttpGenerativeModel::new(&config.model)?);

        let reputation: Option<Arc<dyn ReputationService>> = config
            .reputation_endpoint
            .as_deref()
            .map(HttpReputationService::new)
            .transpose()?
            .map(|c| Arc::new(c) as Arc<dyn ReputationService>);

        let search: Option<Arc<dyn SearchService>> = config
            .search_endpoint
            .as_deref()
            .map(HttpSearchService::new)
            .transpose()?
            .map(|c| Arc::new(c) as Arc<dyn SearchService>);

        let tone: Option<Arc<dyn ToneAnalyzer>> = config
            .tone_endpoint
            .as_deref()
            .map(HttpToneAnalyzer::new)
            .transpose()?
            .map(|c| Arc::new(c) as Arc<dyn ToneAnalyzer>);

        let alerts: Option<Arc<dyn AlertSink>> = config
            .alert_webhook_url
            .as_deref()
            .map(WebhookAlertSink::new)
            .transpose()?
            .map(|c| Arc::new(c) as Arc<dyn AlertSink>);

        if alerts.is_none() {
            tracing::info!("No alert webhook configured; approved leads will not be delivered");
        }

        Ok(Self {
            model,
            reputation,
            search,
            tone,
            alerts,
        })
    }
}
