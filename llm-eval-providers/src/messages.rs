//! Messages API adapter

use async_trait::async_trait;
use llm_eval_core::ProviderKind;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ProviderSettings;
use crate::error::ProviderResult;
use crate::http::{build_client, require_api_key, send_json};
use crate::pricing::{messages_pricing, TokenPricing};
use crate::{Generation, LlmProvider};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Adapter for the messages API.
///
/// The system prompt travels as a top-level field and usage is reported as
/// separate input and output token counts.
#[derive(Clone)]
pub struct MessagesProvider {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: u32,
    pricing: Option<TokenPricing>,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl MessagesProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        settings: &ProviderSettings,
    ) -> ProviderResult<Self> {
        let model = model.into();
        let api_key = require_api_key(ProviderKind::Anthropic.as_str(), api_key.into())?;
        let client = build_client(ProviderKind::Anthropic.as_str(), settings)?;
        let endpoint = format!("{}/v1/messages", settings.base_url_or(DEFAULT_BASE_URL));

        Ok(Self {
            client,
            api_key,
            pricing: messages_pricing(&model),
            model,
            endpoint,
            max_tokens: settings.max_output_tokens,
        })
    }

    pub fn with_pricing(mut self, pricing: Option<TokenPricing>) -> Self {
        self.pricing = pricing;
        self
    }
}

#[async_trait]
impl LlmProvider for MessagesProvider {
    fn provider_name(&self) -> &str {
        ProviderKind::Anthropic.as_str()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> ProviderResult<Generation> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: system_prompt,
            messages: [UserMessage {
                role: "user",
                content: user_message,
            }],
        };

        let started = Instant::now();
        let request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);
        let response: MessagesResponse = send_json(self.provider_name(), request).await?;
        let execution_time_ms = started.elapsed().as_millis() as i64;

        // Only a leading text block counts as output.
        let content = response
            .content
            .into_iter()
            .next()
            .filter(|block| block.kind == "text")
            .and_then(|block| block.text)
            .unwrap_or_default();

        let (tokens_used, cost) = match response.usage {
            Some(usage) => {
                let total = usage.input_tokens + usage.output_tokens;
                let cost = self
                    .pricing
                    .map(|p| p.cost(usage.input_tokens, usage.output_tokens));
                (i32::try_from(total).ok(), cost)
            }
            None => (None, None),
        };

        metrics::histogram!("llm_eval_generation_latency_ms", "provider" => "anthropic")
            .record(execution_time_ms as f64);

        Ok(Generation {
            content,
            model_name: self.model.clone(),
            execution_time_ms,
            tokens_used,
            cost,
        })
    }
}
