use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ids::{ExperimentId, ModelId, TestCaseId};

// ===== Experiment Domain Model =====

/// A configured (system prompt, target model, test case set) unit of evaluation.
///
/// Experiments are reference data: the core only reads them. A new run is the
/// only way an experiment produces new records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Experiment {
    pub id: ExperimentId,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1))]
    pub system_prompt: String,

    pub model_id: ModelId,

    pub test_case_ids: Vec<TestCaseId>,

    pub created_at: DateTime<Utc>,
}

impl Experiment {
    pub fn new(name: String, system_prompt: String, model_id: ModelId) -> Self {
        Self {
            id: ExperimentId::new(),
            name,
            system_prompt,
            model_id,
            test_case_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_test_cases(mut self, test_case_ids: Vec<TestCaseId>) -> Self {
        self.test_case_ids = test_case_ids;
        self
    }

    /// Attach a test case, ignoring duplicates.
    pub fn attach(&mut self, test_case_id: TestCaseId) {
        if !self.test_case_ids.contains(&test_case_id) {
            self.test_case_ids.push(test_case_id);
        }
    }
}

// ===== Test Case =====

/// One (input, expected output, grading strategy) triple.
///
/// `grader_type` keeps the tag exactly as it was stored. It is parsed when the
/// case is graded, so a row carrying an unsupported tag is reported at run time
/// instead of being silently dropped at load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct TestCase {
    pub id: TestCaseId,

    #[validate(length(min = 1))]
    pub user_message: String,

    #[validate(length(min = 1))]
    pub expected_output: String,

    #[validate(length(min = 1, max = 64))]
    pub grader_type: String,

    pub created_at: DateTime<Utc>,
}

impl TestCase {
    pub fn new(
        user_message: impl Into<String>,
        expected_output: impl Into<String>,
        grader_type: impl Into<String>,
    ) -> Self {
        Self {
            id: TestCaseId::new(),
            user_message: user_message.into(),
            expected_output: expected_output.into(),
            grader_type: grader_type.into(),
            created_at: Utc::now(),
        }
    }
}

/// An experiment resolved together with its test cases, in attachment order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentDefinition {
    pub experiment: Experiment,
    pub test_cases: Vec<TestCase>,
}
