//! Error types for platform API calls.
//!
//! Errors carry a transient/permanent classification so the creation retry
//! loop can decide whether another attempt is worthwhile.

use std::time::Duration;

use thiserror::Error;

/// Error returned by discount code API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials were rejected by the auth server or the API.
    #[error("authentication failed: {message}")]
    Unauthorized { message: String },

    /// The requested resource does not exist (HTTP 404).
    #[error("resource not found")]
    NotFound,

    /// The version sent with an update or delete is stale (HTTP 409).
    #[error("version conflict: {message}")]
    Conflict { message: String },

    /// The platform is throttling requests (HTTP 429).
    #[error("rate limited by platform")]
    RateLimited { retry_after: Option<Duration> },

    /// Any other non-2xx response from the platform.
    #[error("platform returned {status}: {message}")]
    Platform { status: u16, message: String },

    /// Connection, TLS or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("could not decode platform response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The client was constructed from unusable settings.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Creation kept failing transiently until the retry window closed.
    #[error("creation gave up after {attempts} attempts in {elapsed:?}: {message}")]
    RetriesExhausted {
        attempts: u32,
        elapsed: Duration,
        message: String,
    },
}

impl ApiError {
    /// Whether another attempt may succeed without operator intervention.
    ///
    /// Retryable: transport failures, throttling, stale-version conflicts
    /// (the next attempt re-reads the current version) and server-side 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::RateLimited { .. } => true,
            ApiError::Conflict { .. } => true,
            _ => self.is_server_error(),
        }
    }

    /// Whether the platform answered with a 5xx status.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ApiError::Platform { status, .. } if *status >= 500)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        ApiError::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type for platform API operations.
pub type ApiResult<T> = Result<T, ApiError>;
