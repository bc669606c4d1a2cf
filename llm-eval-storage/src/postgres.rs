use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use llm_eval_core::{
    EvalStore, EvaluationResult, EvaluationResultId, Experiment, ExperimentDefinition,
    ExperimentId, ExperimentRun, ModelConfig, ModelId, RunId, TestCase, TestCaseId,
    TestCaseResult,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::repositories::{
    EvaluationRepository, ExperimentRepository, ModelConfigRepository, ResultRepository,
    RunRepository,
};

/// Configuration for PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_connections: 20,
            min_connections: 1,
            acquire_timeout_seconds: 5,
            idle_timeout_seconds: 600,  // 10 minutes
            max_lifetime_seconds: 1800, // 30 minutes
        }
    }
}

impl PostgresConfig {
    pub fn new(database_url: String) -> Self {
        Self {
            database_url,
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }
}

/// Create a PostgreSQL connection pool with default settings
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let config = PostgresConfig::new(database_url.to_string());
    create_pool_with_config(&config).await
}

/// Create a PostgreSQL connection pool with custom configuration
pub async fn create_pool_with_config(config: &PostgresConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Some(Duration::from_secs(config.idle_timeout_seconds)))
        .max_lifetime(Some(Duration::from_secs(config.max_lifetime_seconds)))
        .connect(&config.database_url)
        .await?;

    tracing::info!(
        "PostgreSQL connection pool created (max: {}, min: {})",
        config.max_connections,
        config.min_connections
    );

    Ok(pool)
}

/// Run database migrations
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// Health check for database connection
pub async fn health_check(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    tracing::debug!("Database health check passed");
    Ok(())
}

/// [`EvalStore`] backed by PostgreSQL.
pub struct PgStore {
    pool: PgPool,
    experiments: ExperimentRepository,
    models: ModelConfigRepository,
    runs: RunRepository,
    results: ResultRepository,
    evaluations: EvaluationRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            experiments: ExperimentRepository::new(pool.clone()),
            models: ModelConfigRepository::new(pool.clone()),
            runs: RunRepository::new(pool.clone()),
            results: ResultRepository::new(pool.clone()),
            evaluations: EvaluationRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = create_pool_with_config(config).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        migrate(&self.pool).await
    }

    pub async fn health_check(&self) -> Result<()> {
        health_check(&self.pool).await
    }

    pub async fn insert_experiment(&self, experiment: &Experiment) -> llm_eval_core::Result<Experiment> {
        self.experiments.create(experiment).await
    }

    pub async fn insert_test_case(&self, test_case: &TestCase) -> llm_eval_core::Result<TestCase> {
        self.experiments.create_test_case(test_case).await
    }

    pub async fn attach_test_case(
        &self,
        experiment_id: &ExperimentId,
        test_case_id: &TestCaseId,
    ) -> llm_eval_core::Result<()> {
        self.experiments
            .attach_test_case(experiment_id, test_case_id)
            .await
    }

    pub async fn insert_model_config(
        &self,
        model_id: &ModelId,
        config: &ModelConfig,
    ) -> llm_eval_core::Result<ModelConfig> {
        self.models.upsert(model_id, config).await
    }
}

#[async_trait]
impl EvalStore for PgStore {
    async fn load_experiment(
        &self,
        id: &ExperimentId,
    ) -> llm_eval_core::Result<Option<ExperimentDefinition>> {
        self.experiments.get_definition(id).await
    }

    async fn list_model_configs(&self) -> llm_eval_core::Result<Vec<(ModelId, ModelConfig)>> {
        self.models.list().await
    }

    async fn create_run(&self, run: &ExperimentRun) -> llm_eval_core::Result<ExperimentRun> {
        self.runs.create(run).await
    }

    async fn complete_run(
        &self,
        id: &RunId,
        completed_at: DateTime<Utc>,
        aggregate_score: Option<f64>,
    ) -> llm_eval_core::Result<ExperimentRun> {
        self.runs.complete(id, completed_at, aggregate_score).await
    }

    async fn get_run(&self, id: &RunId) -> llm_eval_core::Result<Option<ExperimentRun>> {
        self.runs.get_by_id(id).await
    }

    async fn list_runs(
        &self,
        experiment_id: &ExperimentId,
    ) -> llm_eval_core::Result<Vec<ExperimentRun>> {
        self.runs.list_by_experiment(experiment_id).await
    }

    async fn insert_result(&self, result: &TestCaseResult) -> llm_eval_core::Result<TestCaseResult> {
        self.results.create(result).await
    }

    async fn list_results(&self, run_id: &RunId) -> llm_eval_core::Result<Vec<TestCaseResult>> {
        self.results.list_by_run(run_id).await
    }

    async fn insert_evaluation(
        &self,
        evaluation: &EvaluationResult,
    ) -> llm_eval_core::Result<EvaluationResult> {
        self.evaluations.create(evaluation).await
    }

    async fn get_evaluation(
        &self,
        id: &EvaluationResultId,
    ) -> llm_eval_core::Result<Option<EvaluationResult>> {
        self.evaluations.get_by_id(id).await
    }
}
