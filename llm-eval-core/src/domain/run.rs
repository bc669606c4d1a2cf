use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{EvaluationResultId, ExperimentId, RunId, TestCaseId, TestCaseResultId};
use super::score::clamp_score;

// ===== Run Status =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

// ===== Experiment Run =====

/// One timestamped execution of an experiment.
///
/// A run is created with `completed_at` unset and is stamped exactly once. A run
/// whose batch failed is still stamped, with `aggregate_score` left unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentRun {
    pub id: RunId,
    pub experiment_id: ExperimentId,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub aggregate_score: Option<f64>,
}

impl ExperimentRun {
    pub fn new(experiment_id: ExperimentId) -> Self {
        Self {
            id: RunId::new(),
            experiment_id,
            created_at: Utc::now(),
            completed_at: None,
            aggregate_score: None,
        }
    }

    pub fn status(&self) -> RunStatus {
        if self.completed_at.is_some() {
            RunStatus::Completed
        } else {
            RunStatus::Running
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status().is_terminal()
    }

    /// Stamp completion. The aggregate, when given, is clamped to [0, 100].
    pub fn complete(&mut self, completed_at: DateTime<Utc>, aggregate_score: Option<f64>) {
        self.completed_at = Some(completed_at);
        self.aggregate_score = aggregate_score.map(clamp_score);
    }

    /// Wall-clock duration of the run, if it has completed.
    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|end| (end - self.created_at).num_milliseconds())
    }
}

// ===== Test Case Result =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCaseResult {
    pub id: TestCaseResultId,
    pub run_id: RunId,
    pub test_case_id: TestCaseId,
    pub response: String,
    pub score: f64,
    pub execution_time_ms: i64,
    pub evaluation_result_id: Option<EvaluationResultId>,
    pub model_name: String,
    pub tokens_used: Option<i32>,
    pub cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl TestCaseResult {
    pub fn new(
        run_id: RunId,
        test_case_id: TestCaseId,
        response: String,
        score: f64,
        execution_time_ms: i64,
    ) -> Self {
        Self {
            id: TestCaseResultId::new(),
            run_id,
            test_case_id,
            response,
            score: clamp_score(score),
            execution_time_ms,
            evaluation_result_id: None,
            model_name: String::new(),
            tokens_used: None,
            cost: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_evaluation(mut self, evaluation_result_id: Option<EvaluationResultId>) -> Self {
        self.evaluation_result_id = evaluation_result_id;
        self
    }

    pub fn with_usage(
        mut self,
        model_name: String,
        tokens_used: Option<i32>,
        cost: Option<Decimal>,
    ) -> Self {
        self.model_name = model_name;
        self.tokens_used = tokens_used;
        self.cost = cost;
        self
    }
}
