use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::EvaluationResultId;

/// Sub-category scores returned by the judge model, each in [0, 100].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CategoryScores {
    pub accuracy: f64,
    pub completeness: f64,
    pub relevance: f64,
}

impl CategoryScores {
    pub fn new(accuracy: f64, completeness: f64, relevance: f64) -> Self {
        Self {
            accuracy,
            completeness,
            relevance,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> {
        [self.accuracy, self.completeness, self.relevance].into_iter()
    }

    pub fn mean(&self) -> f64 {
        (self.accuracy + self.completeness + self.relevance) / 3.0
    }

    pub fn min(&self) -> f64 {
        self.iter().fold(f64::INFINITY, f64::min)
    }
}

/// A judge model's verdict on one response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RubricVerdict {
    pub score: f64,
    pub reasoning: String,
    pub categories: CategoryScores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Persisted detail of one `llm_match` grading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub id: EvaluationResultId,
    pub raw_score: f64,
    pub weighted_score: f64,
    pub reasoning: String,
    pub accuracy_score: f64,
    pub completeness_score: f64,
    pub relevance_score: f64,
    pub suggestion: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn from_verdict(verdict: &RubricVerdict, weighted_score: f64) -> Self {
        Self {
            id: EvaluationResultId::new(),
            raw_score: verdict.score,
            weighted_score,
            reasoning: verdict.reasoning.clone(),
            accuracy_score: verdict.categories.accuracy,
            completeness_score: verdict.categories.completeness,
            relevance_score: verdict.categories.relevance,
            suggestion: verdict.suggestion.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn categories(&self) -> CategoryScores {
        CategoryScores::new(
            self.accuracy_score,
            self.completeness_score,
            self.relevance_score,
        )
    }
}
