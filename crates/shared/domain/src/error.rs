//! Domain-level errors.
//!
//! These errors describe entities that cannot be turned into documents (or
//! back). They are independent of the remote service and of configuration.

use thiserror::Error;

/// Domain-specific errors for entity contract violations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Entity shape does not satisfy the document contract
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
