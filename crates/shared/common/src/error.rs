//! Unified error handling for the repository.
//!
//! Every failure, whether it comes from configuration, the remote document
//! service or entity serialization, is reported as a [`RepoError`] and
//! propagated to the caller unchanged. Nothing here retries or recovers.

use domain::DomainError;
use thiserror::Error;

/// Repository error types.
#[derive(Error, Debug)]
pub enum RepoError {
    // Configuration
    #[error("Missing configuration value `{0}`")]
    MissingConfig(&'static str),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    // Authentication & Authorization
    #[error("Authentication rejected by the document service")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    // Resource errors
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    // Query errors
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Query requires a scan: {0}")]
    QueryRequiresScan(String),

    // Entity contract
    #[error("{0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Service availability
    #[error("Too many requests")]
    TooManyRequests,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepoError {
    /// Get a stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RepoError::MissingConfig(_) => "MISSING_CONFIG",
            RepoError::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            RepoError::Unauthorized => "UNAUTHORIZED",
            RepoError::Forbidden => "FORBIDDEN",
            RepoError::NotFound(_) => "NOT_FOUND",
            RepoError::Conflict(_) => "CONFLICT",
            RepoError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            RepoError::BadRequest(_) => "BAD_REQUEST",
            RepoError::QueryRequiresScan(_) => "QUERY_REQUIRES_SCAN",
            RepoError::Validation(_) => "VALIDATION_ERROR",
            RepoError::Serialization(_) => "SERIALIZATION_ERROR",
            RepoError::TooManyRequests => "TOO_MANY_REQUESTS",
            RepoError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            RepoError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP-style status the document service uses for this error.
    ///
    /// Local errors (configuration, serialization) have no status.
    pub fn status(&self) -> Option<u16> {
        match self {
            RepoError::BadRequest(_) | RepoError::QueryRequiresScan(_) => Some(400),
            RepoError::Unauthorized => Some(401),
            RepoError::Forbidden => Some(403),
            RepoError::NotFound(_) => Some(404),
            RepoError::Conflict(_) => Some(409),
            RepoError::PreconditionFailed(_) => Some(412),
            RepoError::TooManyRequests => Some(429),
            RepoError::ServiceUnavailable(_) => Some(503),
            RepoError::Internal(_) => Some(500),
            RepoError::MissingConfig(_)
            | RepoError::InvalidEndpoint(_)
            | RepoError::Validation(_)
            | RepoError::Serialization(_) => None,
        }
    }

    /// Map a status reported by the document service to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => RepoError::BadRequest(message),
            401 => RepoError::Unauthorized,
            403 => RepoError::Forbidden,
            404 => RepoError::NotFound(message),
            409 => RepoError::Conflict(message),
            412 => RepoError::PreconditionFailed(message),
            429 => RepoError::TooManyRequests,
            503 => RepoError::ServiceUnavailable(message),
            _ => RepoError::Internal(format!("status {}: {}", status, message)),
        }
    }

    /// Whether the service refused a query for lack of an index
    pub fn is_scan_required(&self) -> bool {
        matches!(self, RepoError::QueryRequiresScan(_))
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for RepoError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => RepoError::Validation(msg),
            DomainError::Serialization(err) => RepoError::Serialization(err),
        }
    }
}

/// Result type alias
pub type RepoResult<T> = Result<T, RepoError>;

/// Extension trait for Option -> RepoError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, what: impl Into<String>) -> RepoResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, what: impl Into<String>) -> RepoResult<T> {
        self.ok_or_else(|| RepoError::NotFound(what.into()))
    }
}

/// Convenience constructors
impl RepoError {
    pub fn not_found(what: impl Into<String>) -> Self {
        RepoError::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        RepoError::Conflict(what.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        RepoError::BadRequest(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        RepoError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        RepoError::Internal(msg.into())
    }
}
