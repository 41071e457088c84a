use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::models::{Match, Player, StoredAnalysis};
use crate::db::Database;
use crate::provider::HistoryProvider;
use crate::quant::metrics::{extract_metrics, head_to_head_rate};
use crate::quant::{
    analyze_match_deep, AnalysisRequest, AnalysisResult, MatchContext, PlayerInput,
    PlayerMetrics, QuantConfig,
};

/// Application-level knobs that sit outside the pure pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Matches of history fetched per player.
    pub history_limit: usize,
    pub bankroll: f64,
    pub correlation_penalty: f64,
    /// Decimal odds assumed when a match has none stored.
    pub default_odds: f64,
    /// Minimum EV for a scan hit.
    pub min_ev_alert: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            history_limit: 50,
            bankroll: 1000.0,
            correlation_penalty: 0.0,
            default_odds: 1.90,
            min_ev_alert: 0.02,
        }
    }
}

/// Analysis of one side of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionAnalysis {
    pub match_id: String,
    pub tournament: String,
    pub date: NaiveDate,
    pub surface: String,
    pub selection: String,
    pub opponent: String,
    pub result: AnalysisResult,
}

/// Loads history, builds metrics and context, and runs the pipeline for
/// stored matches.
#[derive(Clone)]
pub struct AnalysisEngine {
    db: Database,
    quant: QuantConfig,
    settings: EngineSettings,
}

impl AnalysisEngine {
    pub fn new(db: Database, quant: QuantConfig, settings: EngineSettings) -> Self {
        AnalysisEngine { db, quant, settings }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Metrics for `player` on `surface`, with head-to-head against
    /// `opponent` when given.
    pub fn player_metrics(
        &self,
        player: &Player,
        surface: &str,
        opponent: Option<&Player>,
    ) -> Result<PlayerMetrics> {
        player_metrics(&self.db, &self.quant, self.settings.history_limit, player, surface, opponent)
    }

    /// Analyze both sides of a stored match. `None` when the id is unknown.
    pub fn analyze_by_id(&self, match_id: &str) -> Result<Option<Vec<SelectionAnalysis>>> {
        match self.db.get_match(match_id)? {
            Some(m) => Ok(Some(self.analyze_match(&m)?)),
            None => Ok(None),
        }
    }

    /// Analyze player A's side, then player B's.
    pub fn analyze_match(&self, m: &Match) -> Result<Vec<SelectionAnalysis>> {
        let metrics_a = self.player_metrics(&m.player_a, &m.surface, Some(&m.player_b))?;
        let metrics_b = self.player_metrics(&m.player_b, &m.surface, Some(&m.player_a))?;
        let now = Utc::now();

        let side_a = self.analyze_side(m, metrics_a, metrics_b, now)?;
        let side_b = self.analyze_side(&m.swapped(), metrics_b, metrics_a, now)?;
        Ok(vec![side_a, side_b])
    }

    fn analyze_side(
        &self,
        m: &Match,
        metrics_a: PlayerMetrics,
        metrics_b: PlayerMetrics,
        now: DateTime<Utc>,
    ) -> Result<SelectionAnalysis> {
        let ctx_a = build_context(m, now);
        let request = AnalysisRequest {
            player_a: PlayerInput {
                metrics: metrics_a,
                context: ctx_a,
            },
            player_b: PlayerInput {
                metrics: metrics_b,
                context: ctx_a.mirrored(),
            },
            market_odds: m.odds_a.unwrap_or(self.settings.default_odds),
            opening_odds: m.opening_odds_a,
            bankroll: self.settings.bankroll,
            correlation_penalty: self.settings.correlation_penalty,
        };
        let result = analyze_match_deep(&request, &self.quant)?;
        Ok(SelectionAnalysis {
            match_id: m.id.clone(),
            tournament: m.tournament.clone(),
            date: m.date,
            surface: m.surface.clone(),
            selection: m.player_a.name.clone(),
            opponent: m.player_b.name.clone(),
            result,
        })
    }

    /// Analyze up to `limit` scheduled matches and return the selections
    /// worth betting, best EV first. Hits are persisted.
    pub fn scan(&self, limit: i64) -> Result<Vec<SelectionAnalysis>> {
        let matches = self.db.list_matches("scheduled", limit)?;
        info!("Scanning {} scheduled match(es)", matches.len());

        let mut hits = Vec::new();
        for m in &matches {
            let sides = match self.analyze_match(m) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Skipping match {}: {}", m.id, e);
                    continue;
                }
            };
            for side in sides {
                let r = &side.result;
                if r.classification.is_bet() && r.ev >= self.settings.min_ev_alert {
                    info!(
                        "[VALUE] {} vs {} ({}): p={:.1}% @ {:.2} → EV {:+.1}%, {}",
                        side.selection,
                        side.opponent,
                        side.tournament,
                        r.win_probability * 100.0,
                        r.market_odds,
                        r.ev * 100.0,
                        r.classification
                    );
                    hits.push(side);
                } else {
                    debug!("{} ({}): {}", side.selection, side.match_id, r.classification);
                }
            }
        }

        hits.sort_by(|a, b| b.result.ev.total_cmp(&a.result.ev));
        for hit in &hits {
            self.db.insert_analysis(&stored_analysis(hit))?;
        }
        Ok(hits)
    }
}

/// Extract metrics through any history provider.
pub fn player_metrics(
    provider: &dyn HistoryProvider,
    quant: &QuantConfig,
    history_limit: usize,
    player: &Player,
    surface: &str,
    opponent: Option<&Player>,
) -> Result<PlayerMetrics> {
    let history = provider.player_history(&player.id, history_limit)?;
    debug!(
        "{}: {} match(es) of history for {} from {}",
        player.id,
        history.len(),
        player.name,
        provider.name()
    );
    let metrics = extract_metrics(&history, &player.name, surface, &quant.extractor);
    let h2h = match opponent {
        Some(opp) => head_to_head_rate(&provider.head_to_head(&player.id, &opp.id)?, &player.name),
        None => metrics.head_to_head,
    };
    Ok(metrics.with_head_to_head(h2h))
}

/// Context for player A of `m`. Ranking delta is 0 unless both ranks are known.
pub fn build_context(m: &Match, now: DateTime<Utc>) -> MatchContext {
    let ranking_delta = match (m.player_a.ranking, m.player_b.ranking) {
        (Some(a), Some(b)) => a - b,
        _ => 0,
    };
    MatchContext {
        home_advantage: false,
        ranking_delta,
        injury_risk: false,
        tournament_level: m.level(),
        hours_to_match: hours_until(m.date, now),
    }
}

fn hours_until(date: NaiveDate, now: DateTime<Utc>) -> f64 {
    date.and_hms_opt(0, 0, 0)
        .map(|start| (start.and_utc() - now).num_minutes() as f64 / 60.0)
        .unwrap_or(0.0)
        .max(0.0)
}

fn stored_analysis(s: &SelectionAnalysis) -> StoredAnalysis {
    let r = &s.result;
    StoredAnalysis {
        id: None,
        match_id: s.match_id.clone(),
        selection: s.selection.clone(),
        win_probability: r.win_probability,
        market_odds: r.market_odds,
        ev: r.ev,
        true_edge: r.true_edge,
        risk_level: r.risk_level.to_string(),
        classification: r.classification.to_string(),
        kelly_fraction: r.kelly_fraction,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ImportFile, MatchRow};
    use crate::quant::decision::BetClassification;
    use crate::quant::{MatchHistory, MatchHistoryEntry, TournamentLevel};
    use approx::assert_relative_eq;

    fn player(id: &str, name: &str, ranking: Option<i64>) -> Player {
        Player {
            id: id.into(),
            name: name.into(),
            ranking,
        }
    }

    fn row(id: &str, a: &str, b: &str, day: u32) -> MatchRow {
        MatchRow {
            id: id.into(),
            tournament: "Challenger Lille".into(),
            tournament_level: None,
            surface: "Clay".into(),
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            player_a_id: a.into(),
            player_b_id: b.into(),
            status: "finished".into(),
            winner_name: None,
            score: Some("6-2 6-3".into()),
            odds_a: None,
            odds_b: None,
            opening_odds_a: None,
            opening_odds_b: None,
        }
    }

    /// p1 won ten clay matches, p2 lost ten; they meet in a scheduled match.
    fn engine() -> AnalysisEngine {
        let db = Database::open(":memory:").unwrap();
        let mut matches = Vec::new();
        for day in 1..=10 {
            let mut won = row(&format!("w{day}"), "p1", "p3", day);
            won.winner_name = Some("Ace Winner".into());
            matches.push(won);
            let mut lost = row(&format!("l{day}"), "p2", "p3", day);
            lost.winner_name = Some("Filler Player".into());
            matches.push(lost);
        }
        let mut upcoming = row("next", "p1", "p2", 20);
        upcoming.status = "scheduled".into();
        upcoming.score = None;
        upcoming.odds_a = Some(1.5);
        upcoming.odds_b = Some(2.6);
        matches.push(upcoming);

        db.import(&ImportFile {
            players: vec![
                player("p1", "Ace Winner", Some(10)),
                player("p2", "Bad Loser", Some(50)),
                player("p3", "Filler Player", None),
            ],
            matches,
        })
        .unwrap();

        let mut quant = QuantConfig::default();
        quant.simulation.seed = Some(1);
        quant.simulation.days = 20;
        AnalysisEngine::new(db, quant, EngineSettings::default())
    }

    #[test]
    fn metrics_come_from_stored_history() {
        let e = engine();
        let p1 = e.database().get_player("p1").unwrap().unwrap();
        let m = e.player_metrics(&p1, "Clay", None).unwrap();
        assert_relative_eq!(m.surface_win_rate, 12.0 / 14.0, epsilon = 1e-12);
        assert_relative_eq!(m.form, 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.set_trend, 1.0, epsilon = 1e-12);
        assert_eq!(m.head_to_head, 0.5);
    }

    #[test]
    fn both_sides_are_complementary() {
        let e = engine();
        let sides = e.analyze_by_id("next").unwrap().expect("match exists");
        assert_eq!(sides.len(), 2);
        assert_eq!(sides[0].selection, "Ace Winner");
        assert_eq!(sides[1].selection, "Bad Loser");
        let p = sides[0].result.win_probability + sides[1].result.win_probability;
        assert_relative_eq!(p, 1.0, epsilon = 1e-12);
        assert_eq!(sides[0].result.tournament_level, TournamentLevel::Challenger);
        assert_eq!(sides[1].result.market_odds, 2.6);
    }

    #[test]
    fn unknown_match_is_none() {
        assert!(engine().analyze_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn scan_finds_and_persists_value() {
        let e = engine();
        let hits = e.scan(10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].selection, "Ace Winner");
        assert_eq!(hits[0].result.classification, BetClassification::Acceptable);
        let stored = e.database().list_recent_analyses(10).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].classification, "acceptable");
    }

    #[test]
    fn context_uses_ranking_delta_and_inferred_level() {
        let e = engine();
        let m = e.database().get_match("next").unwrap().unwrap();
        let ctx = build_context(&m, Utc::now());
        assert_eq!(ctx.ranking_delta, -40);
        assert_eq!(ctx.mirrored().ranking_delta, 40);
        assert_eq!(ctx.tournament_level, TournamentLevel::Challenger);
        assert!(!ctx.home_advantage && !ctx.injury_risk);
    }

    #[test]
    fn unknown_ranking_gives_zero_delta() {
        let e = engine();
        let mut m = e.database().get_match("next").unwrap().unwrap();
        m.player_b.ranking = None;
        assert_eq!(build_context(&m, Utc::now()).ranking_delta, 0);
    }

    #[test]
    fn hours_until_is_never_negative() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc();
        assert_relative_eq!(hours_until(day, now), 12.0);
        assert_eq!(hours_until(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), now), 0.0);
    }

    struct FixedHistory {
        history: Vec<MatchHistoryEntry>,
        h2h: Vec<MatchHistoryEntry>,
    }

    impl HistoryProvider for FixedHistory {
        fn player_history(&self, _player_id: &str, limit: usize) -> Result<MatchHistory> {
            Ok(MatchHistory::newest_first(
                self.history.iter().take(limit).cloned().collect(),
            ))
        }

        fn head_to_head(&self, _a: &str, _b: &str) -> Result<Vec<MatchHistoryEntry>> {
            Ok(self.h2h.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn head_to_head_is_injected_from_provider() {
        let entry = |winner: &str| MatchHistoryEntry {
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            surface: "Hard".into(),
            winner_name: Some(winner.into()),
            score: None,
        };
        let provider = FixedHistory {
            history: vec![],
            h2h: vec![entry("Sinner"), entry("Sinner"), entry("Alcaraz")],
        };
        let me = player("p1", "Jannik Sinner", None);
        let opp = player("p2", "Carlos Alcaraz", None);
        let quant = QuantConfig::default();

        let m = player_metrics(&provider, &quant, 50, &me, "Hard", Some(&opp)).unwrap();
        assert_relative_eq!(m.head_to_head, 2.0 / 3.0, epsilon = 1e-12);
        assert_eq!(m.surface_win_rate, 0.5);

        let m = player_metrics(&provider, &quant, 50, &me, "Hard", None).unwrap();
        assert_eq!(m, PlayerMetrics::neutral());
    }
}
