//! Configuration for leadhunt-vet
//!
//! Loaded once at startup from `leadhunt-vet.toml` in the config directory
//! (overridable via `LEADHUNT_VET_CONFIG`), with compiled defaults for every
//! field so the service runs with no config file at all.

use leadhunt_common::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Weighting policy for the external fact-check confidence score.
///
/// The weighting is the single biggest lever on the downstream decision
/// matrix, so it is configuration rather than a literal in the scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VettingPolicy {
    /// Weight applied to the source reputation score
    pub reputation_weight: f64,
    /// Weight applied to the corroboration component
    pub corroboration_weight: f64,
    /// Corroborating-source count above which more sources add nothing
    pub corroboration_cap: i64,
    /// Reputation assigned to domains on neither list when the reputation
    /// collaborator is unavailable
    pub neutral_reputation: i64,
    /// Domains trusted outright (reputation 100)
    pub domain_allow_list: Vec<String>,
    /// Domains rejected outright (reputation 0)
    pub domain_deny_list: Vec<String>,
}

impl Default for VettingPolicy {
    fn default() -> Self {
        Self {
            reputation_weight: 0.5,
            corroboration_weight: 0.5,
            corroboration_cap: 10,
            neutral_reputation: 85,
            domain_allow_list: vec!["reuters.com".to_string(), "bloomberg.com".to_string()],
            domain_deny_list: vec!["my-sensational-blog.net".to_string()],
        }
    }
}

/// Threshold policy for the decision matrix
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// Both scores must exceed this for auto-approval
    pub approve_threshold: i64,
    /// Either score below this forces rejection
    pub reject_threshold: i64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            approve_threshold: 90,
            reject_threshold: 70,
        }
    }
}

/// Join coordinator timing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// Seconds a key may sit with one branch missing before the degraded
    /// default is synthesized
    pub deadline_secs: u64,
    /// Interval between timeout sweeps
    pub sweep_interval_secs: u64,
    /// How long dispatched rows are retained as dedup records before purge
    pub dispatched_retention_secs: u64,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            deadline_secs: 300,
            sweep_interval_secs: 30,
            dispatched_retention_secs: 3600,
        }
    }
}

/// Generative model collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the text-in/JSON-out model service
    pub endpoint: String,
    /// Model identifier passed through to the service
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Minimum interval between requests in milliseconds
    pub rate_limit_ms: u64,
    /// Override path for the prompt template file
    pub prompt_template_path: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434".to_string(),
            model: "gemini-2.5-pro".to_string(),
            timeout_secs: 60,
            rate_limit_ms: 500,
            prompt_template_path: None,
        }
    }
}

/// Service configuration for leadhunt-vet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VetConfig {
    /// HTTP listen port
    pub port: u16,
    /// Reputation service base URL (None: neutral default is used for
    /// unlisted domains)
    pub reputation_endpoint: Option<String>,
    /// Search/triangulation service base URL (None: zero corroboration)
    pub search_endpoint: Option<String>,
    /// Tone analysis service base URL (None: tone gate passes)
    pub tone_endpoint: Option<String>,
    /// Webhook receiving approved-lead alerts (None: alerts skipped)
    pub alert_webhook_url: Option<String>,
    pub model: ModelConfig,
    pub join: JoinConfig,
    pub vetting: VettingPolicy,
    pub decision: DecisionPolicy,
}

impl Default for VetConfig {
    fn default() -> Self {
        Self {
            port: 5741,
            reputation_endpoint: None,
            search_endpoint: None,
            tone_endpoint: None,
            alert_webhook_url: None,
            model: ModelConfig::default(),
            join: JoinConfig::default(),
            vetting: VettingPolicy::default(),
            decision: DecisionPolicy::default(),
        }
    }
}

impl VetConfig {
    /// Load configuration, falling back to compiled defaults.
    ///
    /// Path priority: `LEADHUNT_VET_CONFIG` env var, then
    /// `<config dir>/leadhunt/leadhunt-vet.toml`.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("LEADHUNT_VET_CONFIG") {
            return Self::load_from(Path::new(&path));
        }

        let default_path = dirs::config_path();
        if default_path.exists() {
            return Self::load_from(&default_path);
        }

        info!("No config file found, using compiled defaults");
        Ok(Self::default())
    }

    /// Load configuration from an explicit TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: VetConfig = toml::from_str(&content)
                    .map_err(|e| leadhunt_common::Error::Config(format!(
                        "Failed to parse {}: {}",
                        path.display(),
                        e
                    )))?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!(
                    "Could not read config file {} ({}), using defaults",
                    path.display(),
                    e
                );
                Ok(Self::default())
            }
        }
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn config_path() -> PathBuf {
        leadhunt_common::config::find_config_file()
            .map(|p| p.with_file_name("leadhunt-vet.toml"))
            .unwrap_or_else(|_| PathBuf::from("leadhunt-vet.toml"))
    }
}
