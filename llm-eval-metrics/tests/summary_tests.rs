use approx::assert_relative_eq;
use llm_eval_metrics::ScoreSummary;
use pretty_assertions::assert_eq;

#[test]
fn test_empty_scores_have_no_statistics() {
    let summary = ScoreSummary::from_scores(&[]);
    assert!(summary.is_empty());
    assert_eq!(summary, ScoreSummary::default());
}

#[test]
fn test_single_score() {
    let summary = ScoreSummary::from_scores(&[42.0]);

    assert_eq!(summary.count, 1);
    assert_eq!(summary.mean, Some(42.0));
    assert_eq!(summary.median, Some(42.0));
    assert_eq!(summary.std_dev, Some(0.0));
    assert_eq!(summary.confidence_interval_95, None);
}

#[test]
fn test_descriptive_statistics() {
    let summary = ScoreSummary::from_scores(&[100.0, 0.0, 50.0, 50.0]);

    assert_eq!(summary.count, 4);
    assert_eq!(summary.mean, Some(50.0));
    assert_eq!(summary.median, Some(50.0));
    assert_eq!(summary.min, Some(0.0));
    assert_eq!(summary.max, Some(100.0));
    // population variance = (2500 + 2500 + 0 + 0) / 4
    assert_relative_eq!(summary.std_dev.unwrap(), 1250.0_f64.sqrt(), epsilon = 1e-9);
}

#[test]
fn test_confidence_interval_brackets_mean() {
    let summary = ScoreSummary::from_scores(&[60.0, 70.0, 80.0, 90.0, 100.0]);
    let (lower, upper) = summary.confidence_interval_95.unwrap();

    assert!(lower < 80.0 && 80.0 < upper);
    assert_relative_eq!(80.0 - lower, upper - 80.0, epsilon = 1e-9);
    // t(0.975, 4) ≈ 2.776, sample sd ≈ 15.81
    assert_relative_eq!(upper - 80.0, 2.776 * 250.0_f64.sqrt() / 5.0_f64.sqrt(), epsilon = 0.01);
}

#[test]
fn test_identical_scores_have_degenerate_interval() {
    let summary = ScoreSummary::from_scores(&[75.0, 75.0, 75.0]);
    assert_eq!(summary.confidence_interval_95, Some((75.0, 75.0)));
}
