use llm_eval_core::{clamp_score, CoreError, Result, RubricVerdict};
use serde::{Deserialize, Serialize};

/// How a rule turns a verdict into a 0-100 score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Mean of the three sub-category scores
    Balanced,
    /// Weighted sum of the sub-category scores
    CategoryWeighted {
        accuracy: f64,
        completeness: f64,
        relevance: f64,
    },
    /// 0 when any sub-category is below `threshold`, else the judge's overall score
    MinimumThreshold { threshold: f64 },
}

impl RuleKind {
    pub fn evaluate(&self, verdict: &RubricVerdict) -> f64 {
        let c = &verdict.categories;
        match *self {
            RuleKind::Balanced => c.mean(),
            RuleKind::CategoryWeighted {
                accuracy,
                completeness,
                relevance,
            } => c.accuracy * accuracy + c.completeness * completeness + c.relevance * relevance,
            RuleKind::MinimumThreshold { threshold } => {
                if c.min() < threshold {
                    0.0
                } else {
                    verdict.score
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightedRule {
    pub name: String,
    pub weight: f64,
    #[serde(flatten)]
    pub kind: RuleKind,
}

impl WeightedRule {
    pub fn new(name: impl Into<String>, weight: f64, kind: RuleKind) -> Self {
        Self {
            name: name.into(),
            weight,
            kind,
        }
    }

    pub fn evaluate(&self, verdict: &RubricVerdict) -> f64 {
        self.kind.evaluate(verdict)
    }
}

/// The baseline rule set, in evaluation order.
pub fn default_rules() -> Vec<WeightedRule> {
    vec![
        WeightedRule::new("balanced-scoring", 1.0, RuleKind::Balanced),
        WeightedRule::new(
            "accuracy-focused",
            1.5,
            RuleKind::CategoryWeighted {
                accuracy: 0.6,
                completeness: 0.2,
                relevance: 0.2,
            },
        ),
        WeightedRule::new(
            "minimum-threshold",
            1.0,
            RuleKind::MinimumThreshold { threshold: 50.0 },
        ),
    ]
}

/// Combines rule scores into one weighted mean. Weights need not sum to 1.
#[derive(Debug, Clone)]
pub struct RuleAggregator {
    rules: Vec<WeightedRule>,
    total_weight: f64,
}

impl RuleAggregator {
    pub fn new(rules: Vec<WeightedRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(CoreError::InvalidRuleSet("rule set is empty".to_string()));
        }

        if let Some(rule) = rules
            .iter()
            .find(|r| !r.weight.is_finite() || r.weight <= 0.0)
        {
            return Err(CoreError::InvalidRuleSet(format!(
                "rule '{}' has non-positive weight {}",
                rule.name, rule.weight
            )));
        }

        let total_weight: f64 = rules.iter().map(|r| r.weight).sum();
        if !total_weight.is_finite() || total_weight <= 0.0 {
            return Err(CoreError::InvalidRuleSet(format!(
                "total weight must be positive, got {}",
                total_weight
            )));
        }

        Ok(Self {
            rules,
            total_weight,
        })
    }

    pub fn rules(&self) -> &[WeightedRule] {
        &self.rules
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn aggregate(&self, verdict: &RubricVerdict) -> f64 {
        let weighted_sum: f64 = self
            .rules
            .iter()
            .map(|rule| rule.evaluate(verdict) * rule.weight)
            .sum();

        clamp_score(weighted_sum / self.total_weight)
    }

    /// Per-rule scores, in rule order
    pub fn breakdown(&self, verdict: &RubricVerdict) -> Vec<(&str, f64)> {
        self.rules
            .iter()
            .map(|rule| (rule.name.as_str(), rule.evaluate(verdict)))
            .collect()
    }
}

impl Default for RuleAggregator {
    fn default() -> Self {
        let rules = default_rules();
        let total_weight = rules.iter().map(|r| r.weight).sum();
        Self {
            rules,
            total_weight,
        }
    }
}
