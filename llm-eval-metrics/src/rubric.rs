//! Judge-model rubric scoring

use llm_eval_core::{is_valid_score, CategoryScores, CoreError, Result, RubricVerdict};
use llm_eval_providers::LlmProvider;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// System prompt sent to the judge model.
pub const RUBRIC_PROMPT: &str = r#"You are an expert evaluator of language model responses. Judge how well a given response matches the expected output.

Score the response on:
1. Accuracy (0-100): how factually correct is the response?
2. Completeness (0-100): how fully does it cover every aspect of the expected output?
3. Relevance (0-100): how relevant is it to the original question?

Reply with a single JSON object of this shape:
{
  "score": <overall score 0-100>,
  "reasoning": "<explanation of the evaluation>",
  "categories": {
    "accuracy": <accuracy score>,
    "completeness": <completeness score>,
    "relevance": <relevance score>
  },
  "suggestion": "<optional suggestion for improvement>"
}"#;

/// Wire shape of the judge's reply. Every numeric field is optional here so a
/// missing field is reported by name instead of as a generic decode error.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    score: Option<f64>,
    reasoning: Option<String>,
    categories: Option<RawCategories>,
    #[serde(default)]
    suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCategories {
    accuracy: Option<f64>,
    completeness: Option<f64>,
    relevance: Option<f64>,
}

/// Scores a response against its expected output with a judge model.
#[derive(Clone)]
pub struct RubricEvaluator {
    judge: Arc<dyn LlmProvider>,
}

impl RubricEvaluator {
    pub fn new(judge: Arc<dyn LlmProvider>) -> Self {
        Self { judge }
    }

    pub fn judge(&self) -> &dyn LlmProvider {
        self.judge.as_ref()
    }

    /// Ask the judge for a verdict. Never retries.
    ///
    /// # Errors
    ///
    /// - [`CoreError::EvaluationService`] when the judge call fails
    /// - [`CoreError::MalformedEvaluation`] when the reply is empty, is not a JSON
    ///   object of the rubric shape, or holds a score outside [0, 100]
    pub async fn evaluate(
        &self,
        expected_output: &str,
        actual_response: &str,
        user_message: &str,
        context: Option<&str>,
    ) -> Result<RubricVerdict> {
        let payload = comparison_payload(expected_output, actual_response, user_message, context);

        let generation = self
            .judge
            .generate_structured(RUBRIC_PROMPT, &payload)
            .await
            .map_err(|e| CoreError::EvaluationService(e.to_string()))?;

        debug!(
            judge = self.judge.model(),
            latency_ms = generation.execution_time_ms,
            "Received rubric verdict"
        );

        parse_verdict(&generation.content)
    }
}

impl fmt::Debug for RubricEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RubricEvaluator")
            .field("provider", &self.judge.provider_name())
            .field("model", &self.judge.model())
            .finish()
    }
}

fn comparison_payload(
    expected_output: &str,
    actual_response: &str,
    user_message: &str,
    context: Option<&str>,
) -> String {
    let mut payload = format!("Original Question: {}\n\n", user_message);
    if let Some(context) = context {
        payload.push_str(&format!("Context: {}\n\n", context));
    }
    payload.push_str(&format!(
        "Expected Output: {}\n\nActual Response: {}\n\nEvaluate the actual response against the expected output.",
        expected_output, actual_response
    ));
    payload
}

/// Parse and validate a judge reply.
pub fn parse_verdict(content: &str) -> Result<RubricVerdict> {
    let body = strip_code_fence(content);
    if body.is_empty() {
        return Err(CoreError::MalformedEvaluation(
            "judge returned no content".to_string(),
        ));
    }

    let raw: RawVerdict = serde_json::from_str(body)
        .map_err(|e| CoreError::MalformedEvaluation(format!("invalid verdict JSON: {}", e)))?;

    let categories = raw
        .categories
        .ok_or_else(|| missing("categories"))?;

    let verdict = RubricVerdict {
        score: checked_score("score", raw.score)?,
        reasoning: raw.reasoning.ok_or_else(|| missing("reasoning"))?,
        categories: CategoryScores::new(
            checked_score("categories.accuracy", categories.accuracy)?,
            checked_score("categories.completeness", categories.completeness)?,
            checked_score("categories.relevance", categories.relevance)?,
        ),
        suggestion: raw.suggestion.filter(|s| !s.trim().is_empty()),
    };

    Ok(verdict)
}

fn missing(field: &str) -> CoreError {
    CoreError::MalformedEvaluation(format!("missing field '{}'", field))
}

fn checked_score(field: &str, value: Option<f64>) -> Result<f64> {
    let value = value.ok_or_else(|| missing(field))?;
    if is_valid_score(value) {
        Ok(value)
    } else {
        Err(CoreError::MalformedEvaluation(format!(
            "field '{}' out of range [0, 100]: {}",
            field, value
        )))
    }
}

/// Judges without a JSON mode often wrap the object in a Markdown fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
