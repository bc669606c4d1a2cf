use llm_eval_core::{EvaluationResult, EvaluationResultId, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::map_insert_error;

pub struct EvaluationRepository {
    pool: PgPool,
}

impl EvaluationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a judge evaluation
    pub async fn create(&self, evaluation: &EvaluationResult) -> Result<EvaluationResult> {
        let row = sqlx::query(
            r#"
            INSERT INTO evaluation_results (
                id, raw_score, weighted_score, reasoning, accuracy_score,
                completeness_score, relevance_score, suggestion, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, raw_score, weighted_score, reasoning, accuracy_score,
                      completeness_score, relevance_score, suggestion, created_at
            "#,
        )
        .bind(evaluation.id.0)
        .bind(evaluation.raw_score)
        .bind(evaluation.weighted_score)
        .bind(&evaluation.reasoning)
        .bind(evaluation.accuracy_score)
        .bind(evaluation.completeness_score)
        .bind(evaluation.relevance_score)
        .bind(&evaluation.suggestion)
        .bind(evaluation.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, || format!("evaluation {}", evaluation.id)))?;

        row_to_evaluation(row)
    }

    pub async fn get_by_id(&self, id: &EvaluationResultId) -> Result<Option<EvaluationResult>> {
        let row = sqlx::query(
            r#"
            SELECT id, raw_score, weighted_score, reasoning, accuracy_score,
                   completeness_score, relevance_score, suggestion, created_at
            FROM evaluation_results
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_evaluation).transpose()
    }
}

fn row_to_evaluation(row: PgRow) -> Result<EvaluationResult> {
    let id: Uuid = row.try_get("id")?;

    Ok(EvaluationResult {
        id: EvaluationResultId(id),
        raw_score: row.try_get("raw_score")?,
        weighted_score: row.try_get("weighted_score")?,
        reasoning: row.try_get("reasoning")?,
        accuracy_score: row.try_get("accuracy_score")?,
        completeness_score: row.try_get("completeness_score")?,
        relevance_score: row.try_get("relevance_score")?,
        suggestion: row.try_get("suggestion")?,
        created_at: row.try_get("created_at")?,
    })
}
