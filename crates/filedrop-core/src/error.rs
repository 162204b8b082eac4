//! Error types module
//!
//! All request-level errors are unified under the `AppError` enum. The
//! propagation policy is fixed: best-effort backend failures are absorbed at
//! the attempt site and surface only as log lines, while durability failures
//! (local copy or index flush) always propagate to the caller.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// File id absent, or present under a different owner. The surface is
    /// identical in both cases so ids cannot be probed across owners.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A best-effort remote path failed. Never propagated as a request
    /// failure; callers that see this variant are inside an attempt site.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The local-copy step or an index flush failed. Always fatal to the
    /// request; no partial record is committed.
    #[error("Durability failure: {0}")]
    DurabilityFailure(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl AppError {
    /// Whether this error may be retried by an outer transport layer.
    /// The core itself never retries.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::BackendUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts_to_internal() {
        let err: AppError = io::Error::new(io::ErrorKind::Other, "disk on fire").into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn only_backend_failures_are_recoverable() {
        assert!(AppError::BackendUnavailable("channel".into()).is_recoverable());
        assert!(!AppError::DurabilityFailure("flush".into()).is_recoverable());
        assert!(!AppError::NotFound("x".into()).is_recoverable());
    }
}
