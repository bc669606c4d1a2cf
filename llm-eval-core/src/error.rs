use thiserror::Error;

use crate::domain::ids::{ExperimentId, ModelId};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Experiment not found: {0}")]
    ExperimentNotFound(ExperimentId),

    #[error("No provider configured for model: {0}")]
    ProviderNotConfigured(ModelId),

    #[error("Provider {provider} error: {message}")]
    Provider { provider: String, message: String },

    #[error("Unknown grader type: {0}")]
    UnknownGrader(String),

    #[error("Malformed evaluation: {0}")]
    MalformedEvaluation(String),

    #[error("Evaluation service error: {0}")]
    EvaluationService(String),

    #[error("Invalid rule set: {0}")]
    InvalidRuleSet(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Failures of the judge path, which `llm_match` grading absorbs.
    pub fn is_judge_failure(&self) -> bool {
        matches!(
            self,
            CoreError::MalformedEvaluation(_) | CoreError::EvaluationService(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(feature = "database")]
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        CoreError::Validation(err.to_string())
    }
}
