use chrono::{DateTime, Utc};
use llm_eval_core::{clamp_score, CoreError, ExperimentId, ExperimentRun, Result, RunId};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::map_insert_error;

pub struct RunRepository {
    pool: PgPool,
}

impl RunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an experiment run
    pub async fn create(&self, run: &ExperimentRun) -> Result<ExperimentRun> {
        let row = sqlx::query(
            r#"
            INSERT INTO experiment_runs (id, experiment_id, created_at, completed_at, aggregate_score)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, experiment_id, created_at, completed_at, aggregate_score
            "#,
        )
        .bind(run.id.0)
        .bind(run.experiment_id.0)
        .bind(run.created_at)
        .bind(run.completed_at)
        .bind(run.aggregate_score)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, || format!("run {}", run.id)))?;

        row_to_run(row)
    }

    /// Stamp completion on a run
    pub async fn complete(
        &self,
        id: &RunId,
        completed_at: DateTime<Utc>,
        aggregate_score: Option<f64>,
    ) -> Result<ExperimentRun> {
        let row = sqlx::query(
            r#"
            UPDATE experiment_runs
            SET completed_at = $2, aggregate_score = $3
            WHERE id = $1
            RETURNING id, experiment_id, created_at, completed_at, aggregate_score
            "#,
        )
        .bind(id.0)
        .bind(completed_at)
        .bind(aggregate_score.map(clamp_score))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("run {}", id)))?;

        row_to_run(row)
    }

    /// Get run by ID
    pub async fn get_by_id(&self, id: &RunId) -> Result<Option<ExperimentRun>> {
        let row = sqlx::query(
            r#"
            SELECT id, experiment_id, created_at, completed_at, aggregate_score
            FROM experiment_runs
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_run).transpose()
    }

    /// Runs of an experiment, newest first
    pub async fn list_by_experiment(&self, experiment_id: &ExperimentId) -> Result<Vec<ExperimentRun>> {
        let rows = sqlx::query(
            r#"
            SELECT id, experiment_id, created_at, completed_at, aggregate_score
            FROM experiment_runs
            WHERE experiment_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(experiment_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_run).collect()
    }
}

fn row_to_run(row: PgRow) -> Result<ExperimentRun> {
    let id: Uuid = row.try_get("id")?;
    let experiment_id: Uuid = row.try_get("experiment_id")?;

    Ok(ExperimentRun {
        id: RunId(id),
        experiment_id: ExperimentId(experiment_id),
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
        aggregate_score: row.try_get("aggregate_score")?,
    })
}
