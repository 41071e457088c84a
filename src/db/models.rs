use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::quant::TournamentLevel;

/// A tennis player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    /// Current ATP ranking (1 = best). `None` when unranked or unknown.
    pub ranking: Option<i64>,
}

/// A match row exactly as stored, with players referenced by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub id: String,
    pub tournament: String,
    /// Explicit tier; inferred from the tournament name when absent
    #[serde(default)]
    pub tournament_level: Option<TournamentLevel>,
    pub surface: String,
    pub date: NaiveDate,
    pub player_a_id: String,
    pub player_b_id: String,
    /// "scheduled" | "live" | "finished"
    pub status: String,
    #[serde(default)]
    pub winner_name: Option<String>,
    /// Set scores, e.g. "6-4 6-2"
    #[serde(default)]
    pub score: Option<String>,
    /// Current decimal odds on player A / player B
    #[serde(default)]
    pub odds_a: Option<f64>,
    #[serde(default)]
    pub odds_b: Option<f64>,
    /// Opening decimal odds on player A / player B
    #[serde(default)]
    pub opening_odds_a: Option<f64>,
    #[serde(default)]
    pub opening_odds_b: Option<f64>,
}

/// A match joined with both players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub tournament: String,
    pub tournament_level: Option<TournamentLevel>,
    pub surface: String,
    pub date: NaiveDate,
    pub player_a: Player,
    pub player_b: Player,
    pub status: String,
    pub winner_name: Option<String>,
    pub score: Option<String>,
    pub odds_a: Option<f64>,
    pub odds_b: Option<f64>,
    pub opening_odds_a: Option<f64>,
    pub opening_odds_b: Option<f64>,
}

impl Match {
    pub fn level(&self) -> TournamentLevel {
        self.tournament_level
            .unwrap_or_else(|| TournamentLevel::from_tournament_name(&self.tournament))
    }

    /// Same match seen from player B's side.
    pub fn swapped(&self) -> Match {
        Match {
            player_a: self.player_b.clone(),
            player_b: self.player_a.clone(),
            odds_a: self.odds_b,
            odds_b: self.odds_a,
            opening_odds_a: self.opening_odds_b,
            opening_odds_b: self.opening_odds_a,
            ..self.clone()
        }
    }
}

/// Persisted summary of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub id: Option<i64>,
    pub match_id: String,
    /// Player the probability and stake refer to
    pub selection: String,
    pub win_probability: f64,
    pub market_odds: f64,
    pub ev: f64,
    pub true_edge: f64,
    pub risk_level: String,
    pub classification: String,
    pub kelly_fraction: f64,
    pub created_at: DateTime<Utc>,
}

/// Bulk import file: `{ "players": [...], "matches": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportFile {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub matches: Vec<MatchRow>,
}
