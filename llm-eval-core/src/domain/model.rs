use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Wire format family of a hosted model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Chat-completions API (`/v1/chat/completions`)
    #[serde(rename = "openai")]
    OpenAI,
    /// Messages API (`/v1/messages`) with separate input/output token accounting
    Anthropic,
}

impl ProviderKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(format!("unsupported provider: {value}")),
        }
    }
}

/// Connection settings for one model, as read from the model table or config.
///
/// `provider` is kept as free text: names the registry does not recognize are
/// skipped at registration rather than rejected when the config is loaded.
#[derive(Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct ModelConfig {
    #[validate(length(min = 1))]
    pub provider: String,

    #[validate(length(min = 1, max = 255))]
    pub model_version: String,

    pub api_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ModelConfig {
    pub fn new(
        provider: impl Into<String>,
        model_version: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model_version: model_version.into(),
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn provider_kind(&self) -> Option<ProviderKind> {
        self.provider.parse().ok()
    }
}

// Keeps API keys out of logs.
impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("model_version", &self.model_version)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
