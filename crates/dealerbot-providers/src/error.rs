//! Completion error taxonomy with retry classification.
//!
//! Distinguishes transient failures (worth retrying) from permanent ones.

use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong talking to a completion backend.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The call did not finish within its timeout.
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),

    /// The provider rejected the call with HTTP 429.
    #[error("rate limited by provider: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Any other non-success HTTP status.
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection failed, DNS, TLS, reset, ...
    #[error("network error: {0}")]
    Network(String),

    /// The body could not be decoded or contained no text.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    /// No usable provider/API key for the requested persona.
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl CompletionError {
    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CompletionError::Timeout(_)
            | CompletionError::RateLimited { .. }
            | CompletionError::Network(_) => true,
            CompletionError::Http { status, .. } => *status >= 500,
            CompletionError::MalformedResponse(_) | CompletionError::NotConfigured(_) => false,
        }
    }

    /// Server-suggested delay, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CompletionError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
