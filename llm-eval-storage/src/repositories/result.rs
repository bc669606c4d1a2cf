use llm_eval_core::{
    EvaluationResultId, Result, RunId, TestCaseId, TestCaseResult, TestCaseResultId,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::map_insert_error;

/// Write-once per-case results. The table's (run_id, test_case_id) unique key
/// turns a second result for the same case into `AlreadyExists`.
pub struct ResultRepository {
    pool: PgPool,
}

impl ResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, result: &TestCaseResult) -> Result<TestCaseResult> {
        let row = sqlx::query(
            r#"
            INSERT INTO test_case_results (
                id, run_id, test_case_id, response, score, execution_time_ms,
                evaluation_result_id, model_name, tokens_used, cost, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, run_id, test_case_id, response, score, execution_time_ms,
                      evaluation_result_id, model_name, tokens_used, cost, created_at
            "#,
        )
        .bind(result.id.0)
        .bind(result.run_id.0)
        .bind(result.test_case_id.0)
        .bind(&result.response)
        .bind(result.score)
        .bind(result.execution_time_ms)
        .bind(result.evaluation_result_id.map(|id| id.0))
        .bind(&result.model_name)
        .bind(result.tokens_used)
        .bind(result.cost)
        .bind(result.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_insert_error(e, || {
                format!(
                    "result for test case {} in run {}",
                    result.test_case_id, result.run_id
                )
            })
        })?;

        row_to_result(row)
    }

    /// Results of a run, oldest first
    pub async fn list_by_run(&self, run_id: &RunId) -> Result<Vec<TestCaseResult>> {
        let rows = sqlx::query(
            r#"
            SELECT id, run_id, test_case_id, response, score, execution_time_ms,
                   evaluation_result_id, model_name, tokens_used, cost, created_at
            FROM test_case_results
            WHERE run_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(run_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_result).collect()
    }
}

fn row_to_result(row: PgRow) -> Result<TestCaseResult> {
    let id: Uuid = row.try_get("id")?;
    let run_id: Uuid = row.try_get("run_id")?;
    let test_case_id: Uuid = row.try_get("test_case_id")?;
    let evaluation_result_id: Option<Uuid> = row.try_get("evaluation_result_id")?;

    Ok(TestCaseResult {
        id: TestCaseResultId(id),
        run_id: RunId(run_id),
        test_case_id: TestCaseId(test_case_id),
        response: row.try_get("response")?,
        score: row.try_get("score")?,
        execution_time_ms: row.try_get("execution_time_ms")?,
        evaluation_result_id: evaluation_result_id.map(EvaluationResultId),
        model_name: row.try_get("model_name")?,
        tokens_used: row.try_get("tokens_used")?,
        cost: row.try_get("cost")?,
        created_at: row.try_get("created_at")?,
    })
}
