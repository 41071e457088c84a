use serde::{Deserialize, Serialize};
use std::fmt;

use super::params::DecisionThresholds;
use super::win_probability::RiskLevel;

/// Final recommendation for a single bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetClassification {
    Strong,
    Acceptable,
    /// Market too efficient to beat.
    NoBetEfficiency,
    /// Negative closing-line value or not enough EV for the risk.
    NoBetRisk,
}

impl BetClassification {
    pub fn is_bet(self) -> bool {
        matches!(self, BetClassification::Strong | BetClassification::Acceptable)
    }
}

impl fmt::Display for BetClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BetClassification::Strong => "strong",
            BetClassification::Acceptable => "acceptable",
            BetClassification::NoBetEfficiency => "do not bet: market too efficient",
            BetClassification::NoBetRisk => "do not bet: risk",
        };
        f.write_str(s)
    }
}

/// Classify a bet. Rules are checked in order and the first match wins:
///
/// 1. efficiency above the gate → no bet (efficiency)
/// 2. negative true edge → no bet (risk)
/// 3. EV and edge both strong, risk not High → strong
/// 4. EV acceptable, risk not High → acceptable
/// 5. otherwise → no bet (risk)
pub fn classify(
    ev: f64,
    true_edge: f64,
    efficiency: f64,
    risk: RiskLevel,
    t: &DecisionThresholds,
) -> BetClassification {
    if efficiency > t.max_efficiency {
        return BetClassification::NoBetEfficiency;
    }
    if true_edge < 0.0 {
        return BetClassification::NoBetRisk;
    }
    if ev >= t.strong_ev && true_edge >= t.strong_edge && risk != RiskLevel::High {
        return BetClassification::Strong;
    }
    if ev >= t.acceptable_ev && risk != RiskLevel::High {
        return BetClassification::Acceptable;
    }
    BetClassification::NoBetRisk
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> DecisionThresholds {
        DecisionThresholds::default()
    }

    #[test]
    fn efficiency_gate_overrides_everything() {
        for risk in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            for (ev, edge) in [(0.5, 0.5), (-0.2, -0.1), (0.0, 0.0)] {
                assert_eq!(
                    classify(ev, edge, 0.97, risk, &t()),
                    BetClassification::NoBetEfficiency
                );
            }
        }
    }

    #[test]
    fn negative_edge_is_risk() {
        for eff in [0.85, 0.90, 0.96] {
            for ev in [-0.1, 0.05, 0.3] {
                assert_eq!(
                    classify(ev, -0.01, eff, RiskLevel::Low, &t()),
                    BetClassification::NoBetRisk
                );
            }
        }
    }

    #[test]
    fn strong_needs_ev_and_edge() {
        assert_eq!(classify(0.2, 0.1, 0.9, RiskLevel::Low, &t()), BetClassification::Strong);
        assert_eq!(classify(0.10, 0.05, 0.9, RiskLevel::Medium, &t()), BetClassification::Strong);
        // Strong EV but thin edge falls through to acceptable.
        assert_eq!(
            classify(0.2, 0.01, 0.9, RiskLevel::Low, &t()),
            BetClassification::Acceptable
        );
    }

    #[test]
    fn high_risk_never_bets() {
        assert_eq!(classify(0.5, 0.2, 0.85, RiskLevel::High, &t()), BetClassification::NoBetRisk);
    }

    #[test]
    fn low_ev_is_risk() {
        assert_eq!(classify(0.04, 0.1, 0.85, RiskLevel::Low, &t()), BetClassification::NoBetRisk);
    }

    #[test]
    fn efficiency_at_gate_is_allowed() {
        assert_eq!(classify(0.06, 0.0, 0.96, RiskLevel::Low, &t()), BetClassification::Acceptable);
    }

    #[test]
    fn only_strong_and_acceptable_are_bets() {
        assert!(BetClassification::Strong.is_bet());
        assert!(BetClassification::Acceptable.is_bet());
        assert!(!BetClassification::NoBetRisk.is_bet());
        assert!(!BetClassification::NoBetEfficiency.is_bet());
    }
}
