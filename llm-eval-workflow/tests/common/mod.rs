#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use llm_eval_core::*;
use llm_eval_providers::{Generation, LlmProvider, ProviderError, ProviderResult};
use llm_eval_storage::InMemoryStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub enum Reply {
    Text(String),
    Fail,
    Hang,
}

/// Provider answering by user message, with an optional artificial latency.
pub struct ScriptedProvider {
    replies: HashMap<String, Reply>,
    fallback: Reply,
    delay: Duration,
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(fallback: Reply) -> Self {
        Self {
            replies: HashMap::new(),
            fallback,
            delay: Duration::ZERO,
            delays: HashMap::new(),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn echo_expected(pairs: &[(&str, &str)]) -> Self {
        let mut provider = Self::new(Reply::Text(String::new()));
        for (question, answer) in pairs {
            provider = provider.on(question, Reply::Text(answer.to_string()));
        }
        provider
    }

    pub fn on(mut self, user_message: &str, reply: Reply) -> Self {
        self.replies.insert(user_message.to_string(), reply);
        self
    }

    /// Like [`on`](Self::on), answering only after `delay`.
    pub fn on_after(mut self, user_message: &str, reply: Reply, delay: Duration) -> Self {
        self.delays.insert(user_message.to_string(), delay);
        self.on(user_message, reply)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn generate(&self, _system_prompt: &str, user_message: &str) -> ProviderResult<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(user_message).copied().unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .get(user_message)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        if matches!(reply, Reply::Hang) {
            std::future::pending::<()>().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Reply::Text(content) => Ok(Generation {
                content,
                model_name: "scripted-1".to_string(),
                execution_time_ms: 7,
                tokens_used: Some(12),
                cost: None,
            }),
            Reply::Fail | Reply::Hang => Err(ProviderError::Status {
                provider: "scripted".to_string(),
                status: 500,
                message: format!("no answer for '{}'", user_message),
            }),
        }
    }
}

/// Seeds an experiment over `model` with the given (question, expected, grader) cases.
pub fn seed_experiment(
    store: &InMemoryStore,
    model: &str,
    cases: &[(&str, &str, &str)],
) -> (ExperimentId, Vec<TestCaseId>) {
    let experiment = store
        .insert_experiment(Experiment::new(
            "runner".to_string(),
            "Answer with the city name only.".to_string(),
            ModelId::new(model),
        ))
        .unwrap();

    let ids = cases
        .iter()
        .map(|(question, expected, grader)| {
            let tc = store
                .insert_test_case(TestCase::new(*question, *expected, *grader))
                .unwrap();
            store.attach_test_case(&experiment.id, &tc.id).unwrap();
            tc.id
        })
        .collect();

    (experiment.id, ids)
}

/// Store wrapper counting model-table reads and run completions.
pub struct CountingStore {
    pub inner: InMemoryStore,
    pub model_reads: AtomicUsize,
    pub completion_attempts: AtomicUsize,
    stall_first_completion: bool,
}

impl CountingStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            model_reads: AtomicUsize::new(0),
            completion_attempts: AtomicUsize::new(0),
            stall_first_completion: false,
        }
    }

    /// The first `complete_run` never returns; later ones go through.
    pub fn stalling_first_completion(inner: InMemoryStore) -> Self {
        Self {
            stall_first_completion: true,
            ..Self::new(inner)
        }
    }
}

#[async_trait]
impl EvalStore for CountingStore {
    async fn load_experiment(&self, id: &ExperimentId) -> Result<Option<ExperimentDefinition>> {
        self.inner.load_experiment(id).await
    }

    async fn list_model_configs(&self) -> Result<Vec<(ModelId, ModelConfig)>> {
        self.model_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.list_model_configs().await
    }

    async fn create_run(&self, run: &ExperimentRun) -> Result<ExperimentRun> {
        self.inner.create_run(run).await
    }

    async fn complete_run(
        &self,
        id: &RunId,
        completed_at: DateTime<Utc>,
        aggregate_score: Option<f64>,
    ) -> Result<ExperimentRun> {
        let attempt = self.completion_attempts.fetch_add(1, Ordering::SeqCst);
        if self.stall_first_completion && attempt == 0 {
            std::future::pending::<()>().await;
        }
        self.inner.complete_run(id, completed_at, aggregate_score).await
    }

    async fn get_run(&self, id: &RunId) -> Result<Option<ExperimentRun>> {
        self.inner.get_run(id).await
    }

    async fn list_runs(&self, experiment_id: &ExperimentId) -> Result<Vec<ExperimentRun>> {
        self.inner.list_runs(experiment_id).await
    }

    async fn insert_result(&self, result: &TestCaseResult) -> Result<TestCaseResult> {
        self.inner.insert_result(result).await
    }

    async fn list_results(&self, run_id: &RunId) -> Result<Vec<TestCaseResult>> {
        self.inner.list_results(run_id).await
    }

    async fn insert_evaluation(&self, evaluation: &EvaluationResult) -> Result<EvaluationResult> {
        self.inner.insert_evaluation(evaluation).await
    }

    async fn get_evaluation(&self, id: &EvaluationResultId) -> Result<Option<EvaluationResult>> {
        self.inner.get_evaluation(id).await
    }
}

pub fn shared(provider: ScriptedProvider) -> Arc<ScriptedProvider> {
    Arc::new(provider)
}
