use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    EvaluationResult, EvaluationResultId, ExperimentDefinition, ExperimentId, ExperimentRun,
    ModelConfig, ModelId, RunId, TestCaseResult,
};
use crate::error::Result;

/// Persistence capability the evaluation engine reads from and writes to.
///
/// Result and evaluation rows are write-once; implementations reject a second
/// result for the same (run, test case) pair with `CoreError::AlreadyExists`.
#[async_trait]
pub trait EvalStore: Send + Sync {
    /// Resolve an experiment with its test cases in attachment order.
    async fn load_experiment(&self, id: &ExperimentId) -> Result<Option<ExperimentDefinition>>;

    async fn list_model_configs(&self) -> Result<Vec<(ModelId, ModelConfig)>>;

    async fn create_run(&self, run: &ExperimentRun) -> Result<ExperimentRun>;

    /// Stamp a run as completed, with or without an aggregate score.
    async fn complete_run(
        &self,
        id: &RunId,
        completed_at: DateTime<Utc>,
        aggregate_score: Option<f64>,
    ) -> Result<ExperimentRun>;

    async fn get_run(&self, id: &RunId) -> Result<Option<ExperimentRun>>;

    async fn list_runs(&self, experiment_id: &ExperimentId) -> Result<Vec<ExperimentRun>>;

    async fn insert_result(&self, result: &TestCaseResult) -> Result<TestCaseResult>;

    async fn list_results(&self, run_id: &RunId) -> Result<Vec<TestCaseResult>>;

    async fn insert_evaluation(&self, evaluation: &EvaluationResult) -> Result<EvaluationResult>;

    async fn get_evaluation(&self, id: &EvaluationResultId) -> Result<Option<EvaluationResult>>;
}
