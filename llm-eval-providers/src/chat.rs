//! Chat-completions adapter

use async_trait::async_trait;
use llm_eval_core::ProviderKind;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ProviderSettings;
use crate::error::ProviderResult;
use crate::http::{build_client, require_api_key, send_json};
use crate::pricing::{chat_completion_pricing, TokenPricing};
use crate::{Generation, LlmProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Adapter for the chat-completions API
#[derive(Clone)]
pub struct ChatCompletionProvider {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    pricing: Option<TokenPricing>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    total_tokens: Option<u64>,
}

impl ChatCompletionProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        settings: &ProviderSettings,
    ) -> ProviderResult<Self> {
        let model = model.into();
        let api_key = require_api_key(ProviderKind::OpenAI.as_str(), api_key.into())?;
        let client = build_client(ProviderKind::OpenAI.as_str(), settings)?;
        let endpoint = format!(
            "{}/v1/chat/completions",
            settings.base_url_or(DEFAULT_BASE_URL)
        );

        Ok(Self {
            client,
            api_key,
            pricing: chat_completion_pricing(&model),
            model,
            endpoint,
        })
    }

    /// Replace the pricing table entry, e.g. for fine-tuned models
    pub fn with_pricing(mut self, pricing: Option<TokenPricing>) -> Self {
        self.pricing = pricing;
        self
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        json_mode: bool,
    ) -> ProviderResult<Generation> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let started = Instant::now();
        let request = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body);
        let response: ChatResponse = send_json(self.provider_name(), request).await?;
        let execution_time_ms = started.elapsed().as_millis() as i64;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let (tokens_used, cost) = match response.usage {
            Some(usage) => {
                let total = usage
                    .total_tokens
                    .unwrap_or(usage.prompt_tokens + usage.completion_tokens);
                let cost = self
                    .pricing
                    .map(|p| p.cost(usage.prompt_tokens, usage.completion_tokens));
                (i32::try_from(total).ok(), cost)
            }
            None => (None, None),
        };

        metrics::histogram!("llm_eval_generation_latency_ms", "provider" => "openai")
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

#[async_trait]
impl LlmProvider for ChatCompletionProvider {
    fn provider_name(&self) -> &str {
        ProviderKind::OpenAI.as_str()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> ProviderResult<Generation> {
        self.complete(system_prompt, user_message, false).await
    }

    async fn generate_structured(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> ProviderResult<Generation> {
        self.complete(system_prompt, user_message, true).await
    }
}
