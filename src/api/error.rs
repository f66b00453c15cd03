use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Taxonomy
// ============================================================================
//
// Every failure in the composite service maps to exactly one of these:
// - InvalidInput: caller-supplied key/body failed a precondition, terminal
// - NotFound: primary entity absent (after fallback), terminal
// - Transient: network / 5xx / timeout, fallback- and retry-eligible
// - EventProcessing: one malformed message on the event path, fatal to that
//   message only, never to the consumer loop
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    EventProcessing(String),
}

impl ServiceError {
    /// Transient failures may be retried or replaced by a fallback value;
    /// everything else is terminal and must propagate unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Transient(_))
    }
}

impl crate::utils::IsTransient for ServiceError {
    fn is_transient(&self) -> bool {
        ServiceError::is_transient(self)
    }
}

/// Structured error body returned by the backends and by our own REST
/// surface: `{timestamp, path, status, message}`.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HttpErrorInfo {
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub status: u16,
    pub message: String,
}

impl HttpErrorInfo {
    pub fn new(status: u16, path: &str, message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            path: path.to_string(),
            status,
            message,
        }
    }
}
