//! Extraction stage
//!
//! Turns a raw CandidateDocument into a structured AnalysisRecord by
//! composing the prompt template with the article text, calling the
//! generative model, and parsing the reply as strict JSON.
//!
//! The template is read from disk once per process and cached; concurrent
//! first uses share a single read. A reply that is not valid JSON for the
//! analysis schema is a contract violation: redelivering the same document
//! would reproduce it, so it is dropped rather than retried.

use crate::contracts;
use crate::services::GenerativeModel;
use leadhunt_common::model::{AnalysisRecord, CandidateDocument};
use leadhunt_common::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Compiled-in fallback template, used when no override path is configured
const DEFAULT_TEMPLATE: &str = include_str!("../../prompt_template.txt");

const ARTICLE_PLACEHOLDER: &str = "{{ARTICLE_TEXT}}";
const SOURCE_URL_PLACEHOLDER: &str = "{{SOURCE_URL}}";

pub struct ExtractionStage {
    model: Arc<dyn GenerativeModel>,
    template_path: Option<PathBuf>,
    template: OnceCell<String>,
}

impl ExtractionStage {
    pub fn new(model: Arc<dyn GenerativeModel>, template_path: Option<PathBuf>) -> Self {
        Self {
            model,
            template_path,
            template: OnceCell::new(),
        }
    }

    /// Run extraction for one candidate document.
    ///
    /// Validates the input contract, composes the prompt, calls the model,
    /// and validates the parsed analysis before returning it.
    pub async fn extract(&self, document: &CandidateDocument) -> Result<AnalysisRecord> {
        contracts::validate(document)?;

        let template = self.template().await?;
        let prompt = template
            .replace(ARTICLE_PLACEHOLDER, &document.text)
            .replace(SOURCE_URL_PLACEHOLDER, &document.source_url);

        let reply = self.model.generate(&prompt).await?;
        let analysis = parse_model_reply(&reply)?;
        contracts::validate(&analysis)?;

        tracing::info!(
            identity_key = analysis.identity_key(),
            company_name = %analysis.company_name,
            opportunity_score = analysis.opportunity_score,
            "Extraction complete"
        );
        Ok(analysis)
    }

    /// The prompt template, loaded on first use and cached for the process
    async fn template(&self) -> Result<&String> {
        self.template
            .get_or_try_init(|| async {
                match &self.template_path {
                    Some(path) => {
                        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                            Error::Config(format!(
                                "Failed to read prompt template {}: {}",
                                path.display(),
                                e
                            ))
                        })?;
                        tracing::info!(path = %path.display(), "Loaded prompt template");
                        Ok(content)
                    }
                    None => Ok(DEFAULT_TEMPLATE.to_string()),
                }
            })
            .await
    }
}

/// Parse the model's raw reply into an AnalysisRecord.
///
/// Tolerates a markdown code fence around the JSON (models add one even when
/// told not to) but nothing else.
fn parse_model_reply(reply: &str) -> Result<AnalysisRecord> {
    let body = strip_code_fence(reply.trim());
    serde_json::from_str(body).map_err(|e| {
        Error::contract(
            "analysis_record",
            vec![format!("model reply is not valid analysis JSON: {}", e)],
        )
    })
}

/// Strip a surrounding ``` or ```json fence, if present
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line, then the closing fence
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}
