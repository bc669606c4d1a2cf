//! In-process [`EvalStore`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use llm_eval_core::{
    clamp_score, CoreError, EvalStore, EvaluationResult, EvaluationResultId, Experiment,
    ExperimentDefinition, ExperimentId, ExperimentRun, ModelConfig, ModelId, Result, RunId,
    TestCase, TestCaseId, TestCaseResult,
};
use validator::Validate;

/// Store holding everything in concurrent maps.
///
/// Used by tests and embedders that do not need a database. Enforces the
/// same write-once rules as the PostgreSQL store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    experiments: DashMap<ExperimentId, Experiment>,
    test_cases: DashMap<TestCaseId, TestCase>,
    models: DashMap<ModelId, ModelConfig>,
    runs: DashMap<RunId, ExperimentRun>,
    results: DashMap<RunId, Vec<TestCaseResult>>,
    evaluations: DashMap<EvaluationResultId, EvaluationResult>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_experiment(&self, experiment: Experiment) -> Result<Experiment> {
        experiment.validate()?;

        match self.experiments.entry(experiment.id) {
            Entry::Occupied(_) => Err(CoreError::AlreadyExists(format!(
                "experiment {}",
                experiment.id
            ))),
            Entry::Vacant(slot) => Ok(slot.insert(experiment).clone()),
        }
    }

    pub fn insert_test_case(&self, test_case: TestCase) -> Result<TestCase> {
        test_case.validate()?;

        match self.test_cases.entry(test_case.id) {
            Entry::Occupied(_) => Err(CoreError::AlreadyExists(format!(
                "test case {}",
                test_case.id
            ))),
            Entry::Vacant(slot) => Ok(slot.insert(test_case).clone()),
        }
    }

    /// Append a test case to an experiment. Attaching twice is a no-op.
    pub fn attach_test_case(
        &self,
        experiment_id: &ExperimentId,
        test_case_id: &TestCaseId,
    ) -> Result<()> {
        if !self.test_cases.contains_key(test_case_id) {
            return Err(CoreError::NotFound(format!("test case {}", test_case_id)));
        }

        let mut experiment = self
            .experiments
            .get_mut(experiment_id)
            .ok_or(CoreError::ExperimentNotFound(*experiment_id))?;
        experiment.attach(*test_case_id);
        Ok(())
    }

    /// Insert or replace the configuration stored under `model_id`
    pub fn insert_model_config(&self, model_id: ModelId, config: ModelConfig) -> Result<()> {
        config.validate()?;
        self.models.insert(model_id, config);
        Ok(())
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }
}

#[async_trait]
impl EvalStore for InMemoryStore {
    async fn load_experiment(&self, id: &ExperimentId) -> Result<Option<ExperimentDefinition>> {
        let Some(experiment) = self.experiments.get(id).map(|e| e.clone()) else {
            return Ok(None);
        };

        let test_cases = experiment
            .test_case_ids
            .iter()
            .map(|tc_id| {
                self.test_cases
                    .get(tc_id)
                    .map(|tc| tc.clone())
                    .ok_or_else(|| CoreError::NotFound(format!("test case {}", tc_id)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(ExperimentDefinition {
            experiment,
            test_cases,
        }))
    }

    async fn list_model_configs(&self) -> Result<Vec<(ModelId, ModelConfig)>> {
        let mut configs: Vec<_> = self
            .models
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        configs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(configs)
    }

    async fn create_run(&self, run: &ExperimentRun) -> Result<ExperimentRun> {
        if !self.experiments.contains_key(&run.experiment_id) {
            return Err(CoreError::ExperimentNotFound(run.experiment_id));
        }

        match self.runs.entry(run.id) {
            Entry::Occupied(_) => Err(CoreError::AlreadyExists(format!("run {}", run.id))),
            Entry::Vacant(slot) => Ok(slot.insert(run.clone()).clone()),
        }
    }

    async fn complete_run(
        &self,
        id: &RunId,
        completed_at: DateTime<Utc>,
        aggregate_score: Option<f64>,
    ) -> Result<ExperimentRun> {
        let mut run = self
            .runs
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("run {}", id)))?;
        run.complete(completed_at, aggregate_score.map(clamp_score));
        Ok(run.clone())
    }

    async fn get_run(&self, id: &RunId) -> Result<Option<ExperimentRun>> {
        Ok(self.runs.get(id).map(|run| run.clone()))
    }

    async fn list_runs(&self, experiment_id: &ExperimentId) -> Result<Vec<ExperimentRun>> {
        let mut runs: Vec<_> = self
            .runs
            .iter()
            .filter(|entry| entry.experiment_id == *experiment_id)
            .map(|entry| entry.value().clone())
            .collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }

    async fn insert_result(&self, result: &TestCaseResult) -> Result<TestCaseResult> {
        if !self.runs.contains_key(&result.run_id) {
            return Err(CoreError::NotFound(format!("run {}", result.run_id)));
        }

        let mut results = self.results.entry(result.run_id).or_default();
        if results
            .iter()
            .any(|existing| existing.test_case_id == result.test_case_id || existing.id == result.id)
        {
            return Err(CoreError::AlreadyExists(format!(
                "result for test case {} in run {}",
                result.test_case_id, result.run_id
            )));
        }

        results.push(result.clone());
        Ok(result.clone())
    }

    async fn list_results(&self, run_id: &RunId) -> Result<Vec<TestCaseResult>> {
        Ok(self
            .results
            .get(run_id)
            .map(|results| results.clone())
            .unwrap_or_default())
    }

    async fn insert_evaluation(&self, evaluation: &EvaluationResult) -> Result<EvaluationResult> {
        match self.evaluations.entry(evaluation.id) {
            Entry::Occupied(_) => Err(CoreError::AlreadyExists(format!(
                "evaluation {}",
                evaluation.id
            ))),
            Entry::Vacant(slot) => Ok(slot.insert(evaluation.clone()).clone()),
        }
    }

    async fn get_evaluation(&self, id: &EvaluationResultId) -> Result<Option<EvaluationResult>> {
        Ok(self.evaluations.get(id).map(|e| e.clone()))
    }
}
