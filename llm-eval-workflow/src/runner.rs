use futures::stream::{self, StreamExt};
use llm_eval_core::{
    mean_score, CoreError, EvalStore, ExperimentDefinition, ExperimentId, ExperimentRun, Result,
    RunId, TestCase, TestCaseResult,
};
use llm_eval_metrics::{GraderSet, GraderType};
use llm_eval_providers::{LlmProvider, ProviderRegistry, ProviderSettings};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument, warn};

use crate::finalizer::RunFinalizer;
use crate::summary::RunSummary;

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Runs experiments end to end.
///
/// Providers are registered once per runner, from the store's model table, by
/// [`initialize_providers`](Self::initialize_providers). The registry is then
/// read-only and shared by every concurrent test case.
pub struct ExperimentRunner {
    store: Arc<dyn EvalStore>,
    graders: Arc<GraderSet>,
    registry: OnceCell<ProviderRegistry>,
    settings: ProviderSettings,
    max_concurrency: usize,
}

impl ExperimentRunner {
    pub fn new(store: Arc<dyn EvalStore>, graders: GraderSet) -> Self {
        Self {
            store,
            graders: Arc::new(graders),
            registry: OnceCell::new(),
            settings: ProviderSettings::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Cap on test cases in flight at once. Values below 1 are raised to 1.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Transport settings for adapters built by `initialize_providers`
    pub fn with_provider_settings(mut self, settings: ProviderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Install a prebuilt registry; `initialize_providers` then does nothing.
    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = OnceCell::new_with(Some(registry));
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn registry(&self) -> Option<&ProviderRegistry> {
        self.registry.get()
    }

    /// Build the provider registry from the store's model configurations.
    ///
    /// Only the first call reads the store; later calls return the same registry.
    pub async fn initialize_providers(&self) -> Result<&ProviderRegistry> {
        self.registry
            .get_or_try_init(|| async {
                let configs = self.store.list_model_configs().await?;
                let registry = ProviderRegistry::from_configs_with(configs, &self.settings);
                info!(models = registry.len(), "Providers initialized");
                Ok::<_, CoreError>(registry)
            })
            .await
    }

    /// Execute every test case of an experiment and record the run.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ExperimentNotFound`] / [`CoreError::ProviderNotConfigured`]
    ///   before any run row is written
    /// - the first per-case failure, in test-case order, after the run has been
    ///   stamped complete with no aggregate
    #[instrument(skip_all, fields(experiment_id = %experiment_id))]
    pub async fn run_experiment(&self, experiment_id: &ExperimentId) -> Result<RunSummary> {
        let ExperimentDefinition {
            experiment,
            test_cases,
        } = self
            .store
            .load_experiment(experiment_id)
            .await?
            .ok_or(CoreError::ExperimentNotFound(*experiment_id))?;

        let provider = self
            .registry
            .get()
            .and_then(|registry| registry.get(&experiment.model_id))
            .ok_or_else(|| CoreError::ProviderNotConfigured(experiment.model_id.clone()))?;

        let run = self
            .store
            .create_run(&ExperimentRun::new(*experiment_id))
            .await?;
        let run_id = run.id;
        let finalizer = RunFinalizer::new(Arc::clone(&self.store), run_id);

        info!(
            run_id = %run_id,
            model = provider.model(),
            test_cases = test_cases.len(),
            "Starting experiment run"
        );

        let context = CaseContext {
            run_id,
            system_prompt: Arc::from(experiment.system_prompt),
            provider,
            store: Arc::clone(&self.store),
            graders: Arc::clone(&self.graders),
        };

        let mut outcomes: Vec<(usize, Result<TestCaseResult>)> =
            stream::iter(test_cases.into_iter().enumerate())
                .map(move |(position, test_case)| {
                    let context = context.clone();
                    async move { (position, process_case(context, test_case).await) }
                })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;

        outcomes.sort_by_key(|(position, _)| *position);

        let mut results = Vec::with_capacity(outcomes.len());
        let mut first_error = None;
        for (_, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        if let Some(err) = first_error {
            if let Err(stamp_err) = finalizer.finish(None).await {
                error!(run_id = %run_id, error = %stamp_err, "Failed to stamp failed run");
            }
            metrics::counter!("llm_eval_runs_total", "outcome" => "failed").increment(1);
            warn!(run_id = %run_id, error = %err, "Experiment run failed");
            return Err(err);
        }

        let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
        let run = finalizer.finish(mean_score(&scores)).await?;

        metrics::counter!("llm_eval_runs_total", "outcome" => "completed").increment(1);
        info!(
            run_id = %run.id,
            aggregate_score = ?run.aggregate_score,
            "Experiment run completed"
        );

        Ok(RunSummary::new(run, results))
    }
}

/// Inputs shared by every test-case task of one run.
///
/// Owned so each task future is `'static` and the whole run can be spawned.
#[derive(Clone)]
struct CaseContext {
    run_id: RunId,
    system_prompt: Arc<str>,
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn EvalStore>,
    graders: Arc<GraderSet>,
}

#[instrument(skip_all, fields(test_case_id = %test_case.id, grader = %test_case.grader_type))]
async fn process_case(context: CaseContext, test_case: TestCase) -> Result<TestCaseResult> {
    let outcome = evaluate_case(&context, &test_case).await;

    let grader = test_case
        .grader_type
        .parse::<GraderType>()
        .map(|g| g.as_str())
        .unwrap_or("unknown");

    match &outcome {
        Ok(result) => {
            debug!(score = result.score, latency_ms = result.execution_time_ms, "Test case graded");
            metrics::counter!("llm_eval_test_cases_total", "grader" => grader, "outcome" => "ok")
                .increment(1);
        }
        Err(e) => {
            warn!(error = %e, "Test case failed");
            metrics::counter!("llm_eval_test_cases_total", "grader" => grader, "outcome" => "error")
                .increment(1);
        }
    }

    outcome
}

async fn evaluate_case(context: &CaseContext, test_case: &TestCase) -> Result<TestCaseResult> {
    let generation = context
        .provider
        .generate(&context.system_prompt, &test_case.user_message)
        .await?;

    let grade = context
        .graders
        .grade(
            &test_case.grader_type,
            &generation.content,
            &test_case.expected_output,
            &test_case.user_message,
        )
        .await?;

    let evaluation_id = match &grade.evaluation {
        Some(evaluation) => Some(context.store.insert_evaluation(evaluation).await?.id),
        None => None,
    };

    let result = TestCaseResult::new(
        context.run_id,
        test_case.id,
        generation.content,
        grade.score,
        generation.execution_time_ms,
    )
    .with_evaluation(evaluation_id)
    .with_usage(generation.model_name, generation.tokens_used, generation.cost);

    context.store.insert_result(&result).await
}
