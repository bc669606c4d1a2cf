use llm_eval_core::{CoreError, EvaluationResult, Result, MAX_SCORE, MIN_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use crate::rubric::RubricEvaluator;
use crate::rules::RuleAggregator;

/// Grading strategy named by a test case's grader tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraderType {
    ExactMatch,
    PartialMatch,
    LlmMatch,
}

impl GraderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraderType::ExactMatch => "exact_match",
            GraderType::PartialMatch => "partial_match",
            GraderType::LlmMatch => "llm_match",
        }
    }
}

impl fmt::Display for GraderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraderType {
    type Err = CoreError;

    /// Tags are matched exactly; stored tags are never normalized.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exact_match" => Ok(GraderType::ExactMatch),
            "partial_match" => Ok(GraderType::PartialMatch),
            "llm_match" => Ok(GraderType::LlmMatch),
            other => Err(CoreError::UnknownGrader(other.to_string())),
        }
    }
}

/// 100 when `response` equals `expected` byte for byte, else 0.
pub fn exact_match(response: &str, expected: &str) -> f64 {
    if response == expected {
        MAX_SCORE
    } else {
        MIN_SCORE
    }
}

/// Share of the expected output's distinct words that appear in the response,
/// scaled to 0-100. Case-insensitive; words are split on whitespace.
pub fn partial_match(response: &str, expected: &str) -> f64 {
    let expected_words = word_set(expected);
    if expected_words.is_empty() {
        return MIN_SCORE;
    }

    let response_words = word_set(response);
    let shared = expected_words
        .iter()
        .filter(|word| response_words.contains(*word))
        .count();

    shared as f64 / expected_words.len() as f64 * MAX_SCORE
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Outcome of grading one response.
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub score: f64,
    /// Judge detail, present only for a successful `llm_match`
    pub evaluation: Option<EvaluationResult>,
}

impl Grade {
    pub fn plain(score: f64) -> Self {
        Self {
            score,
            evaluation: None,
        }
    }
}

/// Dispatches grader tags to their strategies.
///
/// `llm_match` goes through the judge model and the rule aggregator; without a
/// judge, or when the judge path fails, it degrades to [`partial_match`].
#[derive(Debug, Clone, Default)]
pub struct GraderSet {
    judge: Option<Arc<RubricEvaluator>>,
    aggregator: RuleAggregator,
}

impl GraderSet {
    pub fn new(judge: Option<RubricEvaluator>, aggregator: RuleAggregator) -> Self {
        Self {
            judge: judge.map(Arc::new),
            aggregator,
        }
    }

    /// Grader set without a judge model
    pub fn lexical() -> Self {
        Self::default()
    }

    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    pub fn aggregator(&self) -> &RuleAggregator {
        &self.aggregator
    }

    /// Score `response` against `expected` with the strategy named by `grader_tag`.
    ///
    /// # Errors
    ///
    /// Only [`CoreError::UnknownGrader`]; judge failures are absorbed.
    pub async fn grade(
        &self,
        grader_tag: &str,
        response: &str,
        expected: &str,
        user_message: &str,
    ) -> Result<Grade> {
        let grader: GraderType = grader_tag.parse()?;

        let grade = match grader {
            GraderType::ExactMatch => Grade::plain(exact_match(response, expected)),
            GraderType::PartialMatch => Grade::plain(partial_match(response, expected)),
            GraderType::LlmMatch => self.judge_or_fallback(response, expected, user_message).await,
        };

        Ok(grade)
    }

    async fn judge_or_fallback(&self, response: &str, expected: &str, user_message: &str) -> Grade {
        let Some(judge) = &self.judge else {
            warn!("No judge model configured, falling back to partial match");
            metrics::counter!("llm_eval_judge_fallbacks_total", "reason" => "no_judge").increment(1);
            return Grade::plain(partial_match(response, expected));
        };

        match judge.evaluate(expected, response, user_message, None).await {
            Ok(verdict) => {
                let weighted = self.aggregator.aggregate(&verdict);
                Grade {
                    score: weighted,
                    evaluation: Some(EvaluationResult::from_verdict(&verdict, weighted)),
                }
            }
            Err(e) => {
                let reason = match e {
                    CoreError::MalformedEvaluation(_) => "malformed",
                    _ => "service",
                };
                warn!(error = %e, "Judge evaluation failed, falling back to partial match");
                metrics::counter!("llm_eval_judge_fallbacks_total", "reason" => reason).increment(1);
                Grade::plain(partial_match(response, expected))
            }
        }
    }
}
