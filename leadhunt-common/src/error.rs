//! Common error types for the leadhunt pipeline

use thiserror::Error;

/// Common result type for leadhunt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across leadhunt services
#[derive(Error, Debug)]
pub enum Error {
    /// A record failed validation against a named stage contract.
    /// Not retryable: redelivery reproduces the same shape mismatch,
    /// so the offending message is logged and dropped.
    #[error("Contract violation in schema '{schema}': {violations:?}")]
    ContractViolation {
        schema: &'static str,
        violations: Vec<String>,
    },

    /// An external collaborator (model service, reputation/search lookup,
    /// tone analyzer, webhook) failed. Retryable via transport redelivery.
    #[error("Collaborator '{collaborator}' failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a contract violation for a named schema
    pub fn contract(schema: &'static str, violations: Vec<String>) -> Self {
        Error::ContractViolation { schema, violations }
    }

    /// Build a collaborator failure
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Error::Collaborator {
            collaborator,
            message: message.into(),
        }
    }
}
