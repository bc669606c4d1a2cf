use chrono::Utc;
use llm_eval_core::*;
use llm_eval_storage::InMemoryStore;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use rust_decimal::Decimal;

struct Seeded {
    store: InMemoryStore,
    experiment_id: ExperimentId,
    test_case_ids: Vec<TestCaseId>,
}

#[fixture]
fn seeded() -> Seeded {
    let store = InMemoryStore::new();
    store
        .insert_model_config(ModelId::new("gpt"), ModelConfig::new("openai", "gpt-4o", "k"))
        .unwrap();

    let experiment = store
        .insert_experiment(Experiment::new(
            "geo".to_string(),
            "Answer tersely.".to_string(),
            ModelId::new("gpt"),
        ))
        .unwrap();

    let mut test_case_ids = Vec::new();
    for (question, answer) in [("Capital of France?", "Paris"), ("Capital of Italy?", "Rome")] {
        let tc = store
            .insert_test_case(TestCase::new(question, answer, "exact_match"))
            .unwrap();
        store.attach_test_case(&experiment.id, &tc.id).unwrap();
        test_case_ids.push(tc.id);
    }

    Seeded {
        store,
        experiment_id: experiment.id,
        test_case_ids,
    }
}

#[rstest]
#[tokio::test]
async fn test_load_experiment_preserves_attachment_order(seeded: Seeded) {
    let definition = seeded
        .store
        .load_experiment(&seeded.experiment_id)
        .await
        .unwrap()
        .unwrap();

    let ids: Vec<_> = definition.test_cases.iter().map(|tc| tc.id).collect();
    assert_eq!(ids, seeded.test_case_ids);
    assert_eq!(definition.experiment.test_case_ids, seeded.test_case_ids);
    assert_eq!(definition.test_cases[0].expected_output, "Paris");
}

#[rstest]
#[tokio::test]
async fn test_attach_twice_is_noop(seeded: Seeded) {
    seeded
        .store
        .attach_test_case(&seeded.experiment_id, &seeded.test_case_ids[0])
        .unwrap();

    let definition = seeded
        .store
        .load_experiment(&seeded.experiment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(definition.test_cases.len(), 2);
}

#[tokio::test]
async fn test_load_missing_experiment_is_none() {
    let store = InMemoryStore::new();
    assert!(store.load_experiment(&ExperimentId::new()).await.unwrap().is_none());
}

#[test]
fn test_seeding_validates_input() {
    let store = InMemoryStore::new();

    let err = store
        .insert_experiment(Experiment::new(String::new(), "p".to_string(), ModelId::new("m")))
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = store
        .insert_test_case(TestCase::new("", "expected", "exact_match"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = store
        .insert_model_config(ModelId::new("m"), ModelConfig::new("", "v", "k"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[test]
fn test_attach_unknown_test_case_fails() {
    let store = InMemoryStore::new();
    let experiment = store
        .insert_experiment(Experiment::new("e".to_string(), "p".to_string(), ModelId::new("m")))
        .unwrap();

    let err = store
        .attach_test_case(&experiment.id, &TestCaseId::new())
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_list_model_configs_is_sorted() {
    let store = InMemoryStore::new();
    store
        .insert_model_config(ModelId::new("zeta"), ModelConfig::new("anthropic", "claude-3-haiku-20240307", "k"))
        .unwrap();
    store
        .insert_model_config(ModelId::new("alpha"), ModelConfig::new("openai", "gpt-4o", "k"))
        .unwrap();

    let configs = store.list_model_configs().await.unwrap();
    let ids: Vec<_> = configs.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "zeta"]);
}

#[rstest]
#[tokio::test]
async fn test_run_lifecycle(seeded: Seeded) {
    let store = &seeded.store;
    let run = store
        .create_run(&ExperimentRun::new(seeded.experiment_id))
        .await
        .unwrap();
    assert_eq!(run.status(), RunStatus::Running);

    let completed_at = Utc::now();
    let completed = store
        .complete_run(&run.id, completed_at, Some(120.0))
        .await
        .unwrap();

    assert_eq!(completed.completed_at, Some(completed_at));
    assert_eq!(completed.aggregate_score, Some(100.0));
    assert_eq!(store.get_run(&run.id).await.unwrap(), Some(completed));
    assert_eq!(store.list_runs(&seeded.experiment_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_run_requires_experiment() {
    let store = InMemoryStore::new();
    let err = store
        .create_run(&ExperimentRun::new(ExperimentId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ExperimentNotFound(_)));
}

#[tokio::test]
async fn test_complete_unknown_run_fails() {
    let store = InMemoryStore::new();
    let err = store
        .complete_run(&RunId::new(), Utc::now(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[rstest]
#[tokio::test]
async fn test_results_are_unique_per_run_and_test_case(seeded: Seeded) {
    let store = &seeded.store;
    let run = store
        .create_run(&ExperimentRun::new(seeded.experiment_id))
        .await
        .unwrap();
    let tc = seeded.test_case_ids[0];

    let first = TestCaseResult::new(run.id, tc, "Paris".to_string(), 100.0, 12).with_usage(
        "gpt-4o".to_string(),
        Some(20),
        Some(Decimal::new(5, 4)),
    );
    store.insert_result(&first).await.unwrap();

    let duplicate = TestCaseResult::new(run.id, tc, "Paris!".to_string(), 0.0, 9);
    let err = store.insert_result(&duplicate).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists(_)));

    let results = store.list_results(&run.id).await.unwrap();
    assert_eq!(results, vec![first]);
}

#[rstest]
#[tokio::test]
async fn test_same_test_case_may_appear_in_different_runs(seeded: Seeded) {
    let store = &seeded.store;
    let tc = seeded.test_case_ids[0];

    for _ in 0..2 {
        let run = store
            .create_run(&ExperimentRun::new(seeded.experiment_id))
            .await
            .unwrap();
        store
            .insert_result(&TestCaseResult::new(run.id, tc, "Paris".to_string(), 100.0, 1))
            .await
            .unwrap();
    }

    assert_eq!(store.run_count(), 2);
}

#[tokio::test]
async fn test_insert_result_for_unknown_run_fails() {
    let store = InMemoryStore::new();
    let result = TestCaseResult::new(RunId::new(), TestCaseId::new(), String::new(), 0.0, 0);
    let err = store.insert_result(&result).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_evaluations_are_write_once() {
    let store = InMemoryStore::new();
    let verdict = RubricVerdict {
        score: 80.0,
        reasoning: "fine".to_string(),
        categories: CategoryScores::new(80.0, 70.0, 90.0),
        suggestion: Some("be brief".to_string()),
    };
    let evaluation = EvaluationResult::from_verdict(&verdict, 77.5);

    store.insert_evaluation(&evaluation).await.unwrap();
    let err = store.insert_evaluation(&evaluation).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists(_)));

    let loaded = store.get_evaluation(&evaluation.id).await.unwrap().unwrap();
    assert_eq!(loaded, evaluation);
    assert_eq!(loaded.categories(), verdict.categories);
}
