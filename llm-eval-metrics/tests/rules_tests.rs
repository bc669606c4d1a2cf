use approx::assert_relative_eq;
use llm_eval_core::{CategoryScores, CoreError, RubricVerdict};
use llm_eval_metrics::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use serde_json::json;

fn verdict(score: f64, accuracy: f64, completeness: f64, relevance: f64) -> RubricVerdict {
    RubricVerdict {
        score,
        reasoning: "r".to_string(),
        categories: CategoryScores::new(accuracy, completeness, relevance),
        suggestion: None,
    }
}

// ===== Individual rules =====

#[test]
fn test_balanced_rule_is_category_mean() {
    let v = verdict(10.0, 90.0, 60.0, 30.0);
    assert_relative_eq!(RuleKind::Balanced.evaluate(&v), 60.0);
}

#[test]
fn test_category_weighted_rule() {
    let rule = RuleKind::CategoryWeighted {
        accuracy: 0.6,
        completeness: 0.2,
        relevance: 0.2,
    };
    let v = verdict(0.0, 100.0, 50.0, 0.0);
    assert_relative_eq!(rule.evaluate(&v), 70.0, epsilon = 1e-9);
}

#[rstest]
#[case(verdict(88.0, 50.0, 50.0, 50.0), 88.0)]
#[case(verdict(88.0, 49.9, 100.0, 100.0), 0.0)]
#[case(verdict(88.0, 100.0, 100.0, 10.0), 0.0)]
fn test_minimum_threshold_rule(#[case] v: RubricVerdict, #[case] expected: f64) {
    let rule = RuleKind::MinimumThreshold { threshold: 50.0 };
    assert_eq!(rule.evaluate(&v), expected);
}

// ===== Aggregation =====

#[test]
fn test_default_rules_order_and_weights() {
    let rules = default_rules();
    let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
    let weights: Vec<_> = rules.iter().map(|r| r.weight).collect();

    assert_eq!(names, vec!["balanced-scoring", "accuracy-focused", "minimum-threshold"]);
    assert_eq!(weights, vec![1.0, 1.5, 1.0]);
    assert_eq!(RuleAggregator::default().total_weight(), 3.5);
}

#[test]
fn test_default_aggregate_all_high() {
    let aggregator = RuleAggregator::default();
    let v = verdict(100.0, 100.0, 100.0, 100.0);
    assert_relative_eq!(aggregator.aggregate(&v), 100.0, epsilon = 1e-9);
}

#[test]
fn test_default_aggregate_with_failing_threshold() {
    let aggregator = RuleAggregator::default();
    // balanced 60, accuracy-focused 0.6*90 + 0.2*60 + 0.2*30 = 72, threshold 0
    let v = verdict(95.0, 90.0, 60.0, 30.0);
    let expected = (60.0 + 72.0 * 1.5 + 0.0) / 3.5;
    assert_relative_eq!(aggregator.aggregate(&v), expected, epsilon = 1e-9);
}

#[test]
fn test_breakdown_lists_rules_in_order() {
    let aggregator = RuleAggregator::default();
    let v = verdict(80.0, 80.0, 80.0, 80.0);
    let breakdown = aggregator.breakdown(&v);

    assert_eq!(breakdown.len(), 3);
    assert_eq!(breakdown[0].0, "balanced-scoring");
    assert_relative_eq!(breakdown[1].1, 80.0, epsilon = 1e-9);
    assert_eq!(breakdown[2], ("minimum-threshold", 80.0));
}

#[test]
fn test_aggregate_is_clamped() {
    let aggregator = RuleAggregator::new(vec![WeightedRule::new(
        "overweighted",
        1.0,
        RuleKind::CategoryWeighted {
            accuracy: 2.0,
            completeness: 0.0,
            relevance: 0.0,
        },
    )])
    .unwrap();

    assert_eq!(aggregator.aggregate(&verdict(0.0, 90.0, 0.0, 0.0)), 100.0);
}

// ===== Invalid rule sets =====

#[rstest]
#[case(vec![])]
#[case(vec![WeightedRule::new("zero", 0.0, RuleKind::Balanced)])]
#[case(vec![WeightedRule::new("negative", -1.0, RuleKind::Balanced)])]
#[case(vec![WeightedRule::new("nan", f64::NAN, RuleKind::Balanced)])]
#[case(vec![
    WeightedRule::new("ok", 1.0, RuleKind::Balanced),
    WeightedRule::new("inf", f64::INFINITY, RuleKind::Balanced),
])]
fn test_invalid_rule_sets_are_rejected(#[case] rules: Vec<WeightedRule>) {
    let err = RuleAggregator::new(rules).unwrap_err();
    assert!(matches!(err, CoreError::InvalidRuleSet(_)));
}

// ===== Configuration format =====

#[test]
fn test_rules_deserialize_from_tagged_config() {
    let value = json!([
        {"name": "balanced-scoring", "weight": 1.0, "kind": "balanced"},
        {
            "name": "accuracy-focused",
            "weight": 1.5,
            "kind": "category_weighted",
            "accuracy": 0.6,
            "completeness": 0.2,
            "relevance": 0.2
        },
        {"name": "minimum-threshold", "weight": 1.0, "kind": "minimum_threshold", "threshold": 50.0}
    ]);

    let rules: Vec<WeightedRule> = serde_json::from_value(value).unwrap();
    assert_eq!(rules, default_rules());
}

#[test]
fn test_unknown_rule_kind_fails_to_deserialize() {
    let value = json!({"name": "x", "weight": 1.0, "kind": "median"});
    assert!(serde_json::from_value::<WeightedRule>(value).is_err());
}

proptest! {
    #[test]
    fn prop_weight_scaling_does_not_change_aggregate(
        factor in 0.01f64..100.0,
        score in 0.0f64..=100.0,
        accuracy in 0.0f64..=100.0,
        completeness in 0.0f64..=100.0,
        relevance in 0.0f64..=100.0,
    ) {
        let base = RuleAggregator::default();
        let scaled_rules = default_rules()
            .into_iter()
            .map(|mut rule| {
                rule.weight *= factor;
                rule
            })
            .collect();
        let scaled = RuleAggregator::new(scaled_rules).unwrap();

        let v = verdict(score, accuracy, completeness, relevance);
        prop_assert!((base.aggregate(&v) - scaled.aggregate(&v)).abs() < 1e-9);
    }

    #[test]
    fn prop_default_aggregate_is_bounded(
        score in 0.0f64..=100.0,
        accuracy in 0.0f64..=100.0,
        completeness in 0.0f64..=100.0,
        relevance in 0.0f64..=100.0,
    ) {
        let v = verdict(score, accuracy, completeness, relevance);
        let aggregate = RuleAggregator::default().aggregate(&v);
        prop_assert!((0.0..=100.0).contains(&aggregate));
    }
}
