//! Player metric extraction from raw match history.
//!
//! Turns a newest-first list of past matches into five signals in [0, 1]:
//!
//! - **Surface win rate**: Beta(2,2)-smoothed win rate on the target surface
//! - **Form**: exponentially decayed win rate over the last 15 matches
//! - **Regularity**: 1 − coefficient of variation of rolling 5-match win rates
//! - **Set trend**: share of sets won over the last 10 matches
//! - **Head-to-head**: injected separately from the head-to-head record set
//!
//! Missing data never errors: every signal falls back to [`NEUTRAL_PRIOR`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::params::{ExtractorParams, NEUTRAL_PRIOR};

/// One historical match as supplied by the history provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchHistoryEntry {
    pub date: NaiveDate,
    /// Court surface, e.g. "Hard", "Clay", "Grass". Empty when unknown.
    pub surface: String,
    pub winner_name: Option<String>,
    /// Space-separated set scores, e.g. "6-4 6-2".
    pub score: Option<String>,
}

/// Match history sorted most-recent-first.
///
/// Form, set trend and the regularity windows are position sensitive, so
/// the only way to build one is through [`MatchHistory::newest_first`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchHistory(Vec<MatchHistoryEntry>);

impl MatchHistory {
    /// Sort `entries` by date descending. Same-day matches keep their
    /// relative input order.
    pub fn newest_first(mut entries: Vec<MatchHistoryEntry>) -> Self {
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        MatchHistory(entries)
    }

    pub fn entries(&self) -> &[MatchHistoryEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The five normalised signals describing one player going into a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetrics {
    /// Smoothed win rate on the match surface. Neutral: 0.5 (prior mean).
    pub surface_win_rate: f64,
    /// Recency-weighted win rate. Neutral: 0.5.
    pub form: f64,
    /// Consistency of results across rolling windows. Neutral: 0.5 with no
    /// history at all, 0.7 when history is shorter than one window.
    pub regularity: f64,
    /// Win rate against this opponent. Neutral: 0.5.
    pub head_to_head: f64,
    /// Share of sets won recently. Neutral: 0.5.
    pub set_trend: f64,
}

impl PlayerMetrics {
    pub fn neutral() -> Self {
        PlayerMetrics {
            surface_win_rate: NEUTRAL_PRIOR,
            form: NEUTRAL_PRIOR,
            regularity: NEUTRAL_PRIOR,
            head_to_head: NEUTRAL_PRIOR,
            set_trend: NEUTRAL_PRIOR,
        }
    }

    pub fn with_head_to_head(mut self, head_to_head: f64) -> Self {
        self.head_to_head = head_to_head;
        self
    }
}

impl Default for PlayerMetrics {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Games in one set, in the order they appear in the score string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetScore {
    pub first: u32,
    pub second: u32,
}

/// Parse a `"g-g g-g ..."` score string. Tokens without a hyphen are
/// ignored and tokens whose sides are not plain numbers are skipped.
pub fn parse_score(score: &str) -> Vec<SetScore> {
    score
        .split_whitespace()
        .filter(|token| token.contains('-'))
        .filter_map(|token| {
            let mut sides = token.split('-');
            let first = sides.next()?.parse::<u32>().ok()?;
            let second = sides.next()?.parse::<u32>().ok()?;
            Some(SetScore { first, second })
        })
        .collect()
}

/// Whether `player_name` won this match.
///
/// Matching is a case-insensitive substring test in either direction, so
/// "Alcaraz" matches "Carlos Alcaraz" and vice versa. Two players sharing a
/// substring can be confused; this tolerance is kept for name-format
/// mismatches between data sources.
///
/// An empty player or winner name never counts as a win. Plain substring
/// matching would treat an empty name as contained in every winner.
pub fn player_won(entry: &MatchHistoryEntry, player_name: &str) -> bool {
    let winner = match entry.winner_name.as_deref() {
        Some(w) if !w.is_empty() => w.to_lowercase(),
        _ => return false,
    };
    let player = player_name.to_lowercase();
    if player.is_empty() {
        return false;
    }
    winner.contains(&player) || player.contains(&winner)
}

/// Extract metrics for `player_name` on `surface`. Head-to-head is left at
/// the neutral prior; use [`PlayerMetrics::with_head_to_head`].
pub fn extract_metrics(
    history: &MatchHistory,
    player_name: &str,
    surface: &str,
    params: &ExtractorParams,
) -> PlayerMetrics {
    if history.is_empty() {
        return PlayerMetrics::neutral();
    }
    let entries = history.entries();
    let wins: Vec<bool> = entries.iter().map(|m| player_won(m, player_name)).collect();

    PlayerMetrics {
        surface_win_rate: surface_win_rate(entries, &wins, surface, params),
        form: form(&wins, params),
        regularity: regularity(&wins, params),
        head_to_head: NEUTRAL_PRIOR,
        set_trend: set_trend(entries, &wins, params),
    }
}

/// Win rate of `player_name` across head-to-head records; 0.5 when none.
pub fn head_to_head_rate(records: &[MatchHistoryEntry], player_name: &str) -> f64 {
    if records.is_empty() {
        return NEUTRAL_PRIOR;
    }
    let wins = records.iter().filter(|m| player_won(m, player_name)).count();
    wins as f64 / records.len() as f64
}

fn surface_win_rate(
    entries: &[MatchHistoryEntry],
    wins: &[bool],
    surface: &str,
    params: &ExtractorParams,
) -> f64 {
    let target = surface.to_lowercase();
    let (played, won) = entries
        .iter()
        .zip(wins)
        .filter(|(m, _)| !m.surface.is_empty() && m.surface.to_lowercase() == target)
        .fold((0usize, 0usize), |(n, w), (_, &won)| (n + 1, w + won as usize));

    if played == 0 {
        return NEUTRAL_PRIOR;
    }
    (won as f64 + params.prior_wins) / (played as f64 + params.prior_wins + params.prior_losses)
}

fn form(wins: &[bool], params: &ExtractorParams) -> f64 {
    let mut weighted_wins = 0.0;
    let mut total_weight = 0.0;
    for (i, &won) in wins.iter().take(params.form_window).enumerate() {
        let weight = (-params.form_decay * i as f64).exp();
        total_weight += weight;
        if won {
            weighted_wins += weight;
        }
    }
    if total_weight > 0.0 {
        weighted_wins / total_weight
    } else {
        NEUTRAL_PRIOR
    }
}

fn regularity(wins: &[bool], params: &ExtractorParams) -> f64 {
    let size = params.regularity_window.max(1);
    let rates: Vec<f64> = wins
        .windows(size)
        .map(|w| w.iter().filter(|&&won| won).count() as f64 / size as f64)
        .collect();

    if rates.is_empty() {
        return params.regularity_default;
    }

    let n = rates.len() as f64;
    let mean = rates.iter().sum::<f64>() / n;
    let variance = rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let cv = if mean > params.regularity_min_mean {
        variance.sqrt() / mean
    } else {
        0.0
    };
    1.0 - cv.clamp(0.0, 1.0)
}

fn set_trend(entries: &[MatchHistoryEntry], wins: &[bool], params: &ExtractorParams) -> f64 {
    let mut total_sets = 0u32;
    let mut sets_won = 0u32;

    for (entry, &won_match) in entries.iter().zip(wins).take(params.set_trend_window) {
        let Some(score) = entry.score.as_deref() else {
            continue;
        };
        for set in parse_score(score) {
            total_sets += 1;
            // A set counts when its higher side agrees with the match result.
            if (won_match && set.first > set.second) || (!won_match && set.first < set.second) {
                sets_won += 1;
            }
        }
    }

    if total_sets == 0 {
        NEUTRAL_PRIOR
    } else {
        sets_won as f64 / total_sets as f64
    }
}
