//! Weighted base score and match-context adjustment.
//!
//!   base  = Σ wᵢ · metricᵢ
//!   final = base × context_factor
//!
//! No clamping is applied: context multipliers compound, so a final score
//! may leave the [0, 1] range of the base score.

use serde::{Deserialize, Serialize};

use super::market::TournamentLevel;
use super::metrics::PlayerMetrics;
use super::params::{ContextFactors, MetricWeights};

/// Situational modifiers for one player in one match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub home_advantage: bool,
    /// Own ranking minus opponent ranking. Negative means better ranked.
    pub ranking_delta: i64,
    pub injury_risk: bool,
    pub tournament_level: TournamentLevel,
    pub hours_to_match: f64,
}

impl MatchContext {
    /// Context for the opponent: ranking delta negated, everything else kept.
    pub fn mirrored(&self) -> Self {
        MatchContext {
            ranking_delta: -self.ranking_delta,
            ..*self
        }
    }
}

pub fn base_score(metrics: &PlayerMetrics, weights: &MetricWeights) -> f64 {
    metrics.surface_win_rate * weights.surface_win_rate
        + metrics.form * weights.form
        + metrics.regularity * weights.regularity
        + metrics.set_trend * weights.set_trend
        + metrics.head_to_head * weights.head_to_head
}

pub fn context_factor(ctx: &MatchContext, factors: &ContextFactors) -> f64 {
    let mut factor = 1.0;
    if ctx.home_advantage {
        factor *= 1.0 + factors.home_advantage;
    }
    // Only the better-ranked player gets a bonus; the underdog is not penalised.
    if ctx.ranking_delta < 0 {
        factor *= 1.0 + ctx.ranking_delta.unsigned_abs() as f64 * factors.ranking_bonus_per_place;
    }
    if ctx.injury_risk {
        factor *= 1.0 - factors.injury_penalty;
    }
    factor
}

pub fn final_score(
    metrics: &PlayerMetrics,
    ctx: &MatchContext,
    weights: &MetricWeights,
    factors: &ContextFactors,
) -> f64 {
    base_score(metrics, weights) * context_factor(ctx, factors)
}
