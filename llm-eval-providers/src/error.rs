//! Adapter error types

use llm_eval_core::CoreError;
use thiserror::Error;

/// Failure of a single generation call. Every variant names the provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request never produced a response (connect, timeout, TLS, ...)
    #[error("{provider} request failed: {source}")]
    Http {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("{provider} API error: {status} - {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },

    /// The response body could not be decoded
    #[error("{provider} returned an undecodable response: {message}")]
    Decode { provider: String, message: String },

    #[error("{provider} adapter misconfigured: {message}")]
    Configuration { provider: String, message: String },
}

impl ProviderError {
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::Http { provider, .. }
            | ProviderError::Status { provider, .. }
            | ProviderError::Decode { provider, .. }
            | ProviderError::Configuration { provider, .. } => provider,
        }
    }

    /// HTTP status, if the service answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status_code(), Some(401) | Some(403))
    }
}

/// Result type alias for adapter calls
pub type ProviderResult<T> = Result<T, ProviderError>;

impl From<ProviderError> for CoreError {
    fn from(err: ProviderError) -> Self {
        CoreError::Provider {
            provider: err.provider().to_string(),
            message: err.to_string(),
        }
    }
}
