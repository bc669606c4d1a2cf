use llm_eval_core::{
    Experiment, ExperimentDefinition, ExperimentId, ModelId, Result, TestCase, TestCaseId,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;
use validator::Validate;

use super::map_insert_error;

/// Experiments, test cases and the ordered link between them.
pub struct ExperimentRepository {
    pool: PgPool,
}

impl ExperimentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an experiment and link any test cases it already lists
    pub async fn create(&self, experiment: &Experiment) -> Result<Experiment> {
        experiment.validate()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO experiments (id, name, system_prompt, model_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(experiment.id.0)
        .bind(&experiment.name)
        .bind(&experiment.system_prompt)
        .bind(experiment.model_id.as_str())
        .bind(experiment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, || format!("experiment {}", experiment.id)))?;

        for (position, test_case_id) in experiment.test_case_ids.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO experiment_test_cases (experiment_id, test_case_id, position)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(experiment.id.0)
            .bind(test_case_id.0)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(experiment.clone())
    }

    pub async fn create_test_case(&self, test_case: &TestCase) -> Result<TestCase> {
        test_case.validate()?;

        let row = sqlx::query(
            r#"
            INSERT INTO test_cases (id, user_message, expected_output, grader_type, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_message, expected_output, grader_type, created_at
            "#,
        )
        .bind(test_case.id.0)
        .bind(&test_case.user_message)
        .bind(&test_case.expected_output)
        .bind(&test_case.grader_type)
        .bind(test_case.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, || format!("test case {}", test_case.id)))?;

        row_to_test_case(row)
    }

    /// Append a test case to the end of an experiment. Attaching twice is a no-op.
    pub async fn attach_test_case(
        &self,
        experiment_id: &ExperimentId,
        test_case_id: &TestCaseId,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO experiment_test_cases (experiment_id, test_case_id, position)
            SELECT $1, $2, COALESCE(MAX(position) + 1, 0)
            FROM experiment_test_cases
            WHERE experiment_id = $1
            ON CONFLICT (experiment_id, test_case_id) DO NOTHING
            "#,
        )
        .bind(experiment_id.0)
        .bind(test_case_id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolve an experiment with its test cases in attachment order
    pub async fn get_definition(&self, id: &ExperimentId) -> Result<Option<ExperimentDefinition>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, name, system_prompt, model_id, created_at
            FROM experiments
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let mut experiment = row_to_experiment(row)?;

        let rows = sqlx::query(
            r#"
            SELECT tc.id, tc.user_message, tc.expected_output, tc.grader_type, tc.created_at
            FROM experiment_test_cases etc
            JOIN test_cases tc ON tc.id = etc.test_case_id
            WHERE etc.experiment_id = $1
            ORDER BY etc.position
            "#,
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        let test_cases = rows
            .into_iter()
            .map(row_to_test_case)
            .collect::<Result<Vec<_>>>()?;

        experiment.test_case_ids = test_cases.iter().map(|tc| tc.id).collect();

        Ok(Some(ExperimentDefinition {
            experiment,
            test_cases,
        }))
    }
}

fn row_to_experiment(row: PgRow) -> Result<Experiment> {
    let id: Uuid = row.try_get("id")?;
    let model_id: String = row.try_get("model_id")?;

    Ok(Experiment {
        id: ExperimentId(id),
        name: row.try_get("name")?,
        system_prompt: row.try_get("system_prompt")?,
        model_id: ModelId::new(model_id),
        test_case_ids: Vec::new(),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_test_case(row: PgRow) -> Result<TestCase> {
    let id: Uuid = row.try_get("id")?;

    Ok(TestCase {
        id: TestCaseId(id),
        user_message: row.try_get("user_message")?,
        expected_output: row.try_get("expected_output")?,
        grader_type: row.try_get("grader_type")?,
        created_at: row.try_get("created_at")?,
    })
}
