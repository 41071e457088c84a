//! Monte Carlo bankroll simulation for a stream of similar bets.
//!
//! Every path starts from the same bankroll and places `trades_per_day`
//! bets per day, each staking a fixed fraction of the current bankroll at a
//! fixed win rate and decimal odds. Per path we track the running peak and
//! the worst peak-to-trough drawdown. A path stops trading once it falls to
//! the ruin threshold or its bankroll would overflow `f64`.
//!
//! Paths are independent (path `i` is seeded with `seed + i`), so results
//! are reproducible for a fixed seed regardless of evaluation order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::params::SimulationParams;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSimResult {
    /// Worst peak-to-trough drawdown seen on any path (0.0–1.0).
    pub max_drawdown: f64,
    /// Share of paths that hit the ruin threshold.
    pub prob_ruin: f64,
    /// Mean ending bankroll ratio − 1. Not annualised.
    pub cagr: f64,
    /// Annualised Sharpe ratio of the pooled daily returns of all paths.
    pub sharpe: f64,
    pub paths: usize,
    pub days: usize,
}

struct PathOutcome {
    ending_ratio: f64,
    max_drawdown: f64,
    ruined: bool,
}

/// Run the simulation at `win_rate` and decimal `odds`.
pub fn simulate_portfolio(win_rate: f64, odds: f64, params: &SimulationParams) -> PortfolioSimResult {
    let paths = params.paths.max(1);
    let mut daily_returns = Vec::with_capacity(paths * params.days);
    let mut outcomes = Vec::with_capacity(paths);

    for i in 0..paths {
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
            None => StdRng::from_entropy(),
        };
        outcomes.push(simulate_path(&mut rng, win_rate, odds, params, &mut daily_returns));
    }

    let n = outcomes.len() as f64;
    let max_drawdown = outcomes.iter().map(|o| o.max_drawdown).fold(0.0, f64::max);
    let ruins = outcomes.iter().filter(|o| o.ruined).count();
    let finite: Vec<f64> = outcomes
        .iter()
        .map(|o| o.ending_ratio)
        .filter(|r| r.is_finite())
        .collect();
    let mean_ratio = if finite.is_empty() {
        1.0
    } else {
        let m = finite.len() as f64;
        let total: f64 = finite.iter().sum();
        if total.is_finite() {
            total / m
        } else {
            // Near-MAX ratios overflow the plain sum; divide first.
            finite.iter().map(|r| r / m).sum()
        }
    };

    PortfolioSimResult {
        max_drawdown,
        prob_ruin: ruins as f64 / n,
        cagr: mean_ratio - 1.0,
        sharpe: sharpe_ratio(&daily_returns, params.periods_per_year),
        paths,
        days: params.days,
    }
}

fn simulate_path(
    rng: &mut StdRng,
    win_rate: f64,
    odds: f64,
    params: &SimulationParams,
    daily_returns: &mut Vec<f64>,
) -> PathOutcome {
    let initial = params.initial_bankroll;
    let ruin_level = initial * params.ruin_threshold;
    let mut bankroll = initial;
    let mut peak = initial;
    let mut max_drawdown: f64 = 0.0;
    let mut ruined = false;

    for _ in 0..params.days {
        let start = bankroll;
        let mut saturated = false;
        for _ in 0..params.trades_per_day {
            let stake = bankroll * params.stake_fraction;
            let next = if rng.gen::<f64>() < win_rate {
                bankroll + stake * (odds - 1.0)
            } else {
                bankroll - stake
            };
            // Huge odds can compound past f64::MAX; freeze the last finite value.
            if !next.is_finite() {
                saturated = true;
                break;
            }
            bankroll = next;
        }
        if start > 0.0 {
            daily_returns.push(bankroll / start - 1.0);
        }

        peak = peak.max(bankroll);
        if peak > 0.0 {
            max_drawdown = max_drawdown.max((peak - bankroll) / peak);
        }
        if bankroll <= ruin_level {
            ruined = true;
            break;
        }
        if saturated {
            break;
        }
    }

    PathOutcome {
        ending_ratio: bankroll / initial,
        max_drawdown,
        ruined,
    }
}

/// Sample Sharpe ratio (zero risk-free rate) scaled by √periods_per_year.
/// Zero when there are fewer than two returns or no dispersion.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();
    if !std.is_finite() || std < 1e-12 {
        return 0.0;
    }
    let sharpe = mean / std * periods_per_year.max(0.0).sqrt();
    if sharpe.is_finite() {
        sharpe
    } else {
        0.0
    }
}
