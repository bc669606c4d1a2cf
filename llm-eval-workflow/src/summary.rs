use llm_eval_core::{mean_score, CoreError, EvalStore, ExperimentRun, Result, RunId, TestCaseResult};
use llm_eval_metrics::ScoreSummary;
use serde::{Deserialize, Serialize};

/// A run together with its per-case results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run: ExperimentRun,
    pub results: Vec<TestCaseResult>,
    pub stats: ScoreSummary,
}

impl RunSummary {
    pub fn new(run: ExperimentRun, results: Vec<TestCaseResult>) -> Self {
        let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
        Self {
            stats: ScoreSummary::from_scores(&scores),
            run,
            results,
        }
    }

    /// Whether the stored aggregate agrees with the mean of the results
    pub fn aggregate_is_consistent(&self) -> bool {
        match (self.run.aggregate_score, recompute_aggregate(&self.results)) {
            (Some(stored), Some(recomputed)) => (stored - recomputed).abs() < 1e-9,
            (None, _) => true,
            (Some(_), None) => false,
        }
    }
}

/// Mean of the result scores, `None` for an empty run.
pub fn recompute_aggregate(results: &[TestCaseResult]) -> Option<f64> {
    let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
    mean_score(&scores)
}

/// Reload a run and its results from the store.
pub async fn load_run_summary(store: &dyn EvalStore, run_id: &RunId) -> Result<RunSummary> {
    let run = store
        .get_run(run_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("run {}", run_id)))?;
    let results = store.list_results(run_id).await?;
    Ok(RunSummary::new(run, results))
}
