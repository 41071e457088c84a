//! Market efficiency and closing-line value.
//!
//! Efficiency is a fixed proxy per tournament tier: Grand Slam lines are
//! sharp, Challenger lines are soft. The closing line is projected with a
//! simple steam heuristic:
//!
//!   expected_drop  = steam_probability × (1 − efficiency) × max_drop
//!   closing_odds   = open_odds × (1 − expected_drop)
//!   true_edge      = open_odds / closing_odds − 1
//!
//! True edge is independent of the model's own probability, so it works as
//! a second opinion on whether the price is worth taking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::params::MarketParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TournamentLevel {
    GrandSlam,
    Masters1000,
    #[serde(rename = "ATP500")]
    Atp500,
    #[serde(rename = "ATP250")]
    #[default]
    Atp250,
    Challenger,
}

impl TournamentLevel {
    /// Market efficiency in (0, 1) for this tier.
    pub fn market_efficiency(self) -> f64 {
        match self {
            TournamentLevel::GrandSlam => 0.98,
            TournamentLevel::Masters1000 => 0.95,
            TournamentLevel::Atp500 => 0.92,
            TournamentLevel::Atp250 => 0.90,
            TournamentLevel::Challenger => 0.85,
        }
    }

    /// Best-effort tier from a tournament name. Unknown names are ATP250.
    pub fn from_tournament_name(name: &str) -> Self {
        let n = name.to_lowercase();
        const SLAMS: [&str; 5] = [
            "australian open",
            "roland garros",
            "french open",
            "wimbledon",
            "us open",
        ];
        if SLAMS.iter().any(|s| n.contains(s)) {
            TournamentLevel::GrandSlam
        } else if n.contains("challenger") {
            TournamentLevel::Challenger
        } else if n.contains("masters") || n.contains("1000") {
            TournamentLevel::Masters1000
        } else if n.contains("500") {
            TournamentLevel::Atp500
        } else {
            TournamentLevel::Atp250
        }
    }
}

impl fmt::Display for TournamentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TournamentLevel::GrandSlam => "GrandSlam",
            TournamentLevel::Masters1000 => "Masters1000",
            TournamentLevel::Atp500 => "ATP500",
            TournamentLevel::Atp250 => "ATP250",
            TournamentLevel::Challenger => "Challenger",
        };
        f.write_str(s)
    }
}

impl FromStr for TournamentLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['_', '-', ' '], "");
        match key.as_str() {
            "grandslam" => Ok(TournamentLevel::GrandSlam),
            "masters1000" | "masters" => Ok(TournamentLevel::Masters1000),
            "atp500" => Ok(TournamentLevel::Atp500),
            "atp250" => Ok(TournamentLevel::Atp250),
            "challenger" => Ok(TournamentLevel::Challenger),
            _ => anyhow::bail!("unknown tournament level: {}", s),
        }
    }
}

/// Projected closing decimal odds for a line opening at `open_odds`.
pub fn predict_closing_odds(open_odds: f64, efficiency: f64, params: &MarketParams) -> f64 {
    let expected_drop = params.steam_probability * (1.0 - efficiency) * params.max_closing_drop;
    open_odds * (1.0 - expected_drop)
}

/// Closing-line value of taking `open_odds`. Zero when the projected close
/// is at or below 1.0.
pub fn true_edge(open_odds: f64, predicted_closing_odds: f64) -> f64 {
    if predicted_closing_odds <= 1.0 {
        return 0.0;
    }
    open_odds / predicted_closing_odds - 1.0
}
