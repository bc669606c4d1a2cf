use llm_eval_core::{ModelConfig, ModelId, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use validator::Validate;

pub struct ModelConfigRepository {
    pool: PgPool,
}

impl ModelConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the configuration stored under `model_id`
    pub async fn upsert(&self, model_id: &ModelId, config: &ModelConfig) -> Result<ModelConfig> {
        config.validate()?;

        let row = sqlx::query(
            r#"
            INSERT INTO llm_models (id, provider, model_version, api_key, base_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET provider = EXCLUDED.provider,
                model_version = EXCLUDED.model_version,
                api_key = EXCLUDED.api_key,
                base_url = EXCLUDED.base_url
            RETURNING id, provider, model_version, api_key, base_url
            "#,
        )
        .bind(model_id.as_str())
        .bind(&config.provider)
        .bind(&config.model_version)
        .bind(&config.api_key)
        .bind(&config.base_url)
        .fetch_one(&self.pool)
        .await?;

        let (_, config) = row_to_model_config(row)?;
        Ok(config)
    }

    pub async fn get(&self, model_id: &ModelId) -> Result<Option<ModelConfig>> {
        let row = sqlx::query(
            r#"
            SELECT id, provider, model_version, api_key, base_url
            FROM llm_models
            WHERE id = $1
            "#,
        )
        .bind(model_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_model_config)
            .transpose()
            .map(|found| found.map(|(_, config)| config))
    }

    /// Every stored configuration, ordered by model id
    pub async fn list(&self) -> Result<Vec<(ModelId, ModelConfig)>> {
        let rows = sqlx::query(
            r#"
            SELECT id, provider, model_version, api_key, base_url
            FROM llm_models
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_model_config).collect()
    }
}

fn row_to_model_config(row: PgRow) -> Result<(ModelId, ModelConfig)> {
    let id: String = row.try_get("id")?;
    let config = ModelConfig {
        provider: row.try_get("provider")?,
        model_version: row.try_get("model_version")?,
        api_key: row.try_get("api_key")?,
        base_url: row.try_get("base_url")?,
    };
    Ok((ModelId::new(id), config))
}
