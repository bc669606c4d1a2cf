//! Hosted model adapters
//!
//! This crate wraps hosted language models behind one capability,
//! [`LlmProvider`]: send a system prompt and a user message, get back the
//! generated text with latency, token and cost metadata.
//!
//! # Variants
//!
//! - [`ChatCompletionProvider`]: chat-completions wire format (`provider = "openai"`)
//! - [`MessagesProvider`]: messages wire format with separate input/output token
//!   accounting (`provider = "anthropic"`)
//!
//! Adapters are selected by [`ProviderKind`](llm_eval_core::ProviderKind) when a
//! [`ProviderRegistry`] is built from model configurations. The registry is
//! immutable once built and can be shared across concurrent generation calls.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use llm_eval_core::{ModelConfig, ModelId};
//! use llm_eval_providers::{LlmProvider, ProviderRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ProviderRegistry::from_configs(vec![(
//!     ModelId::new("gpt-4o"),
//!     ModelConfig::new("openai", "gpt-4o", "sk-..."),
//! )]);
//!
//! let provider = registry.get(&ModelId::new("gpt-4o")).expect("registered");
//! let generation = provider
//!     .generate("Answer tersely.", "What is the capital of France?")
//!     .await?;
//! println!("{} ({} ms)", generation.content, generation.execution_time_ms);
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Transport failures, non-success statuses and undecodable bodies are all
//! reported as [`ProviderError`], naming the provider. No call is retried.

pub mod chat;
pub mod config;
pub mod error;
pub mod messages;
pub mod pricing;
pub mod registry;

mod http;

pub use chat::ChatCompletionProvider;
pub use config::ProviderSettings;
pub use error::{ProviderError, ProviderResult};
pub use messages::MessagesProvider;
pub use pricing::TokenPricing;
pub use registry::{build_provider, ProviderRegistry, ProviderRegistryBuilder};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Output of one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// Generated text; empty when the service returned no text
    pub content: String,
    pub model_name: String,
    /// Wall-clock time from request start to response receipt
    pub execution_time_ms: i64,
    pub tokens_used: Option<i32>,
    /// `None` when the model has no entry in the pricing table
    pub cost: Option<Decimal>,
}

/// Uniform capability over a hosted model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider identity used in logs and error messages
    fn provider_name(&self) -> &str;

    /// Model version requests are sent to
    fn model(&self) -> &str;

    async fn generate(&self, system_prompt: &str, user_message: &str)
        -> ProviderResult<Generation>;

    /// Like [`generate`](Self::generate), but asks the service for a single JSON
    /// object where the wire format supports it.
    async fn generate_structured(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> ProviderResult<Generation> {
        self.generate(system_prompt, user_message).await
    }
}
