use async_trait::async_trait;
use llm_eval_providers::{Generation, LlmProvider, ProviderError, ProviderResult};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Judge that replays a canned reply and counts its calls.
pub struct ScriptedJudge {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedJudge {
    pub fn replying(content: impl Into<String>) -> Self {
        Self {
            reply: Some(content.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedJudge {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "judge-1"
    }

    async fn generate(&self, _system_prompt: &str, _user_message: &str) -> ProviderResult<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(content) => Ok(Generation {
                content: content.clone(),
                model_name: "judge-1".to_string(),
                execution_time_ms: 3,
                tokens_used: None,
                cost: None,
            }),
            None => Err(ProviderError::Status {
                provider: "scripted".to_string(),
                status: 503,
                message: "judge unavailable".to_string(),
            }),
        }
    }
}

pub fn verdict_json(score: f64, accuracy: f64, completeness: f64, relevance: f64) -> String {
    format!(
        r#"{{"score": {}, "reasoning": "looks right", "categories": {{"accuracy": {}, "completeness": {}, "relevance": {}}}}}"#,
        score, accuracy, completeness, relevance
    )
}
