//! Adapter configuration
//!
//! Transport settings shared by every adapter variant. Credentials and the
//! model version come from [`ModelConfig`](llm_eval_core::ModelConfig).

use std::time::Duration;

/// Transport settings for an adapter
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Overrides the vendor's default API root
    pub base_url: Option<String>,

    /// Request timeout
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Output token cap sent to APIs that require one
    pub max_output_tokens: u32,

    /// User agent string
    pub user_agent: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            max_output_tokens: 1024,
            user_agent: format!("llm-eval-providers/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ProviderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the adapter at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Resolve the API root, falling back to `default_base`
    pub(crate) fn base_url_or<'a>(&'a self, default_base: &'a str) -> &'a str {
        self.base_url
            .as_deref()
            .unwrap_or(default_base)
            .trim_end_matches('/')
    }
}
