//! # Leadhunt Common Library
//!
//! Shared code for the leadhunt pipeline services including:
//! - Wire contracts (candidate documents, analysis records, verification results)
//! - Error types
//! - Event types (PipelineEvent enum) and the broadcast EventBus
//! - Configuration loading and root folder resolution

pub mod config;
pub mod error;
pub mod events;
pub mod model;

pub use error::{Error, Result};
