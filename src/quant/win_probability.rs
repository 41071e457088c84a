//! Pre-match win probability from two final player scores.
//!
//!   P(A wins) = 1 / (1 + exp(−k · (score_A − score_B)))
//!
//! with steepness k = 6.5 by default. The model is a pure function of the
//! two scalars; P(B) = 1 − P(A) holds as long as B's score was built from
//! the mirrored match context.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::params::DecisionThresholds;

/// Logistic win probability for player A.
pub fn win_probability(score_a: f64, score_b: f64, k: f64) -> f64 {
    sigmoid(k * (score_a - score_b))
}

/// Expected value of a unit stake at decimal `odds` given model probability.
pub fn expected_value(model_prob: f64, odds: f64) -> f64 {
    model_prob * odds - 1.0
}

/// How close the model is to a coin flip. Closer means riskier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(prob: f64, thresholds: &DecisionThresholds) -> Self {
        let confidence = (prob - 0.5).abs();
        if confidence < thresholds.high_risk_below {
            RiskLevel::High
        } else if confidence < thresholds.medium_risk_below {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}

/// Standard logistic sigmoid function.
fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
