use llm_eval_core::mean_score;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Descriptive statistics over a set of 0-100 scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Population standard deviation
    pub std_dev: Option<f64>,
    /// Student-t interval on the mean; needs at least two scores
    pub confidence_interval_95: Option<(f64, f64)>,
}

impl ScoreSummary {
    pub fn empty() -> Self {
        Self {
            count: 0,
            mean: None,
            median: None,
            min: None,
            max: None,
            std_dev: None,
            confidence_interval_95: None,
        }
    }

    pub fn from_scores(scores: &[f64]) -> Self {
        let Some(mean) = mean_score(scores) else {
            return Self::empty();
        };

        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = scores.len() as f64;
        let squared_deviations: f64 = scores.iter().map(|x| (x - mean).powi(2)).sum();
        let std_dev = (squared_deviations / n).sqrt();

        Self {
            count: scores.len(),
            mean: Some(mean),
            median: Some(median(&sorted)),
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            std_dev: Some(std_dev),
            confidence_interval_95: confidence_interval(scores.len(), mean, squared_deviations, 0.95),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for ScoreSummary {
    fn default() -> Self {
        Self::empty()
    }
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn confidence_interval(
    count: usize,
    mean: f64,
    squared_deviations: f64,
    confidence: f64,
) -> Option<(f64, f64)> {
    if count < 2 {
        return None;
    }

    let n = count as f64;
    let df = n - 1.0;
    let sample_std_dev = (squared_deviations / df).sqrt();

    let t_dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let t_value = t_dist.inverse_cdf((1.0 + confidence) / 2.0);
    let margin = t_value * (sample_std_dev / n.sqrt());

    Some((mean - margin, mean + margin))
}
