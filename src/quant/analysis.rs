//! End-to-end match analysis: scores → probability → EV and edge →
//! classification → stake → bankroll simulation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::decision::{classify, BetClassification};
use super::kelly::portfolio_kelly_stake;
use super::market::{predict_closing_odds, true_edge, TournamentLevel};
use super::metrics::PlayerMetrics;
use super::params::QuantConfig;
use super::portfolio::{simulate_portfolio, PortfolioSimResult};
use super::score::{final_score, MatchContext};
use super::win_probability::{expected_value, win_probability, RiskLevel};

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("{field} must be finite decimal odds above 1.0 (got {value})")]
    InvalidOdds { field: &'static str, value: f64 },
    #[error("correlation penalty must be in [0, 1] (got {0})")]
    InvalidCorrelationPenalty(f64),
    #[error("bankroll must be finite and non-negative (got {0})")]
    InvalidBankroll(f64),
}

/// One side of the match going into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub metrics: PlayerMetrics,
    pub context: MatchContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub player_a: PlayerInput,
    pub player_b: PlayerInput,
    /// Current decimal odds on player A.
    pub market_odds: f64,
    /// Opening decimal odds on player A; defaults to `market_odds`.
    pub opening_odds: Option<f64>,
    pub bankroll: f64,
    pub correlation_penalty: f64,
}

impl AnalysisRequest {
    fn validate(&self) -> Result<(), AnalysisError> {
        check_odds("market_odds", self.market_odds)?;
        if let Some(open) = self.opening_odds {
            check_odds("opening_odds", open)?;
        }
        if !(0.0..=1.0).contains(&self.correlation_penalty) {
            return Err(AnalysisError::InvalidCorrelationPenalty(self.correlation_penalty));
        }
        if !self.bankroll.is_finite() || self.bankroll < 0.0 {
            return Err(AnalysisError::InvalidBankroll(self.bankroll));
        }
        Ok(())
    }
}

fn check_odds(field: &'static str, value: f64) -> Result<(), AnalysisError> {
    if value.is_finite() && value > 1.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidOdds { field, value })
    }
}

/// Everything computed for one match. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score_a: f64,
    pub score_b: f64,
    /// Model probability that player A wins.
    pub win_probability: f64,
    pub market_odds: f64,
    pub opening_odds: f64,
    pub predicted_closing_odds: f64,
    pub ev: f64,
    pub true_edge: f64,
    pub market_efficiency: f64,
    pub tournament_level: TournamentLevel,
    pub risk_level: RiskLevel,
    pub classification: BetClassification,
    /// Quarter-Kelly stake as a fraction of bankroll.
    pub kelly_fraction: f64,
    /// Quarter-Kelly stake in bankroll currency.
    pub kelly_stake: f64,
    pub portfolio: PortfolioSimResult,
    pub metrics_a: PlayerMetrics,
    pub metrics_b: PlayerMetrics,
}

/// Run the full pipeline for player A against player B.
///
/// Only malformed numeric inputs fail; missing data has already been
/// resolved to neutral metrics upstream.
pub fn analyze_match_deep(
    request: &AnalysisRequest,
    config: &QuantConfig,
) -> Result<AnalysisResult, AnalysisError> {
    request.validate()?;

    let a = &request.player_a;
    let b = &request.player_b;
    let score_a = final_score(&a.metrics, &a.context, &config.weights, &config.context);
    let score_b = final_score(&b.metrics, &b.context, &config.weights, &config.context);
    let prob_a = win_probability(score_a, score_b, config.logistic_k);

    let odds = request.market_odds;
    let opening_odds = request.opening_odds.unwrap_or(odds);
    let ev = expected_value(prob_a, odds);

    let tournament_level = a.context.tournament_level;
    let efficiency = tournament_level.market_efficiency();
    let predicted_closing_odds = predict_closing_odds(opening_odds, efficiency, &config.market);
    let edge = true_edge(opening_odds, predicted_closing_odds);

    let risk_level = RiskLevel::from_probability(prob_a, &config.decision);
    let classification = classify(ev, edge, efficiency, risk_level, &config.decision);

    let kelly_fraction = portfolio_kelly_stake(prob_a, odds, 1.0, request.correlation_penalty);
    let portfolio = simulate_portfolio(prob_a, odds, &config.simulation);

    debug!(
        "analysis: p={:.3} ev={:+.3} edge={:+.4} eff={:.2} risk={} → {}",
        prob_a, ev, edge, efficiency, risk_level, classification
    );

    Ok(AnalysisResult {
        score_a,
        score_b,
        win_probability: prob_a,
        market_odds: odds,
        opening_odds,
        predicted_closing_odds,
        ev,
        true_edge: edge,
        market_efficiency: efficiency,
        tournament_level,
        risk_level,
        classification,
        kelly_fraction,
        kelly_stake: kelly_fraction * request.bankroll,
        portfolio,
        metrics_a: a.metrics,
        metrics_b: b.metrics,
    })
}
