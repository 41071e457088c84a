//! Tunable constants for every stage of the scoring pipeline.
//!
//! Each stage takes its parameters by reference instead of reading module
//! level constants, so the whole pipeline stays side-effect free and any
//! stage can be exercised in isolation with a non-default table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// "No information" value used for every metric when data is missing.
pub const NEUTRAL_PRIOR: f64 = 0.5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("metric weight {0} must be finite and non-negative (got {1})")]
    InvalidWeight(&'static str, f64),
    #[error("logistic steepness must be positive (got {0})")]
    Steepness(f64),
    #[error("{0} must be at least 1")]
    ZeroWindow(&'static str),
    #[error("simulation stake fraction must be in (0, 1) (got {0})")]
    StakeFraction(f64),
    #[error("simulation initial bankroll must be positive (got {0})")]
    InitialBankroll(f64),
    #[error("simulation ruin threshold must be in [0, 1) (got {0})")]
    RuinThreshold(f64),
}

/// Weights of the five player metrics in the base score. The defaults sum
/// to 0.90, so neutral metrics score 0.45 rather than 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    pub surface_win_rate: f64,
    pub form: f64,
    pub regularity: f64,
    pub set_trend: f64,
    pub head_to_head: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        MetricWeights {
            surface_win_rate: 0.25,
            form: 0.20,
            regularity: 0.20,
            set_trend: 0.10,
            head_to_head: 0.15,
        }
    }
}

impl MetricWeights {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("surface_win_rate", self.surface_win_rate),
            ("form", self.form),
            ("regularity", self.regularity),
            ("set_trend", self.set_trend),
            ("head_to_head", self.head_to_head),
        ]
    }
}

/// Windows and priors used when turning raw history into metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractorParams {
    /// Beta prior pseudo-wins for surface smoothing.
    pub prior_wins: f64,
    /// Beta prior pseudo-losses for surface smoothing.
    pub prior_losses: f64,
    pub form_window: usize,
    /// Exponential decay per position for form weighting.
    pub form_decay: f64,
    pub regularity_window: usize,
    /// Regularity reported when history is too short for one full window.
    pub regularity_default: f64,
    /// Mean window win rate at or below which CV is treated as 0.
    pub regularity_min_mean: f64,
    pub set_trend_window: usize,
}

impl Default for ExtractorParams {
    fn default() -> Self {
        ExtractorParams {
            prior_wins: 2.0,
            prior_losses: 2.0,
            form_window: 15,
            form_decay: 0.15,
            regularity_window: 5,
            regularity_default: 0.7,
            regularity_min_mean: 0.01,
            set_trend_window: 10,
        }
    }
}

/// Multipliers applied to a base score from match context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextFactors {
    pub home_advantage: f64,
    /// Bonus per ranking place when the player is the better-ranked one.
    pub ranking_bonus_per_place: f64,
    pub injury_penalty: f64,
}

impl Default for ContextFactors {
    fn default() -> Self {
        ContextFactors {
            home_advantage: 0.04,
            ranking_bonus_per_place: 0.001,
            injury_penalty: 0.20,
        }
    }
}

/// Closing-line projection heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Likelihood of sharp money moving the line, absent better information.
    pub steam_probability: f64,
    /// Largest modelled drop from open to close, as a fraction of the open.
    pub max_closing_drop: f64,
}

impl Default for MarketParams {
    fn default() -> Self {
        MarketParams {
            steam_probability: 0.5,
            max_closing_drop: 0.20,
        }
    }
}

/// Gates and thresholds for the bet classifier and risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    pub max_efficiency: f64,
    pub strong_ev: f64,
    pub strong_edge: f64,
    pub acceptable_ev: f64,
    /// |p - 0.5| below this is High risk.
    pub high_risk_below: f64,
    /// |p - 0.5| below this (and not High) is Medium risk.
    pub medium_risk_below: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        DecisionThresholds {
            max_efficiency: 0.96,
            strong_ev: 0.10,
            strong_edge: 0.05,
            acceptable_ev: 0.05,
            high_risk_below: 0.10,
            medium_risk_below: 0.20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub paths: usize,
    pub days: usize,
    pub trades_per_day: usize,
    /// Fraction of current bankroll staked on every simulated trade.
    pub stake_fraction: f64,
    pub initial_bankroll: f64,
    /// A path is ruined once its bankroll falls to this fraction of the
    /// initial bankroll. Fixed-fraction staking never reaches exactly zero.
    pub ruin_threshold: f64,
    /// Annualisation factor for the Sharpe ratio of daily returns.
    pub periods_per_year: f64,
    /// Base seed; path `i` uses `seed + i`. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            paths: 20,
            days: 250,
            trades_per_day: 3,
            stake_fraction: 0.02,
            initial_bankroll: 1000.0,
            ruin_threshold: 0.01,
            periods_per_year: 365.0,
            seed: None,
        }
    }
}

/// Full parameter set for one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantConfig {
    pub weights: MetricWeights,
    pub extractor: ExtractorParams,
    pub context: ContextFactors,
    pub market: MarketParams,
    pub decision: DecisionThresholds,
    pub simulation: SimulationParams,
    /// Steepness `k` of the logistic win-probability link.
    pub logistic_k: f64,
}

impl Default for QuantConfig {
    fn default() -> Self {
        QuantConfig {
            weights: MetricWeights::default(),
            extractor: ExtractorParams::default(),
            context: ContextFactors::default(),
            market: MarketParams::default(),
            decision: DecisionThresholds::default(),
            simulation: SimulationParams::default(),
            logistic_k: 6.5,
        }
    }
}

impl QuantConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, w) in self.weights.named() {
            if !(w.is_finite() && w >= 0.0) {
                return Err(ConfigError::InvalidWeight(name, w));
            }
        }
        if !(self.logistic_k > 0.0) {
            return Err(ConfigError::Steepness(self.logistic_k));
        }
        let ex = &self.extractor;
        if ex.form_window == 0 {
            return Err(ConfigError::ZeroWindow("form_window"));
        }
        if ex.regularity_window == 0 {
            return Err(ConfigError::ZeroWindow("regularity_window"));
        }
        if ex.set_trend_window == 0 {
            return Err(ConfigError::ZeroWindow("set_trend_window"));
        }
        let sim = &self.simulation;
        if sim.paths == 0 {
            return Err(ConfigError::ZeroWindow("simulation paths"));
        }
        if !(sim.stake_fraction > 0.0 && sim.stake_fraction < 1.0) {
            return Err(ConfigError::StakeFraction(sim.stake_fraction));
        }
        if !(sim.initial_bankroll > 0.0) {
            return Err(ConfigError::InitialBankroll(sim.initial_bankroll));
        }
        if !(0.0..1.0).contains(&sim.ruin_threshold) {
            return Err(ConfigError::RuinThreshold(sim.ruin_threshold));
        }
        Ok(())
    }
}
