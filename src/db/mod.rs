use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod models;
use models::*;

use crate::provider::HistoryProvider;
use crate::quant::{MatchHistory, MatchHistoryEntry, TournamentLevel};

/// Thread-safe SQLite connection pool (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Players ───────────────────────────────────────────────────────────────

    pub fn get_player(&self, id: &str) -> Result<Option<Player>> {
        let conn = self.conn()?;
        let player = conn
            .query_row(
                "SELECT id, name, ranking FROM players WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Player {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        ranking: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(player)
    }

    // ── Matches ───────────────────────────────────────────────────────────────

    /// Fetch one match joined with both players
    pub fn get_match(&self, id: &str) -> Result<Option<Match>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE m.id = ?1", MATCH_SELECT);
        let m = conn.query_row(&sql, params![id], map_match).optional()?;
        Ok(m)
    }

    /// List matches with the given status, soonest first
    pub fn list_matches(&self, status: &str, limit: i64) -> Result<Vec<Match>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE m.status = ?1 ORDER BY m.date ASC, m.id ASC LIMIT ?2", MATCH_SELECT);
        let mut stmt = conn.prepare(&sql)?;
        let matches = stmt
            .query_map(params![status, limit], map_match)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(matches)
    }

    /// Import players and matches in one transaction. Returns the number of
    /// (players, matches) written.
    pub fn import(&self, file: &ImportFile) -> Result<(usize, usize)> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for p in &file.players {
            upsert_player_on(&tx, p)?;
        }
        for m in &file.matches {
            upsert_match_on(&tx, m)?;
        }
        tx.commit()?;
        Ok((file.players.len(), file.matches.len()))
    }

    // ── Analyses ──────────────────────────────────────────────────────────────

    pub fn insert_analysis(&self, a: &StoredAnalysis) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO analysis_results (
                match_id, selection, win_probability, market_odds, ev,
                true_edge, risk_level, classification, kelly_fraction, created_at
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                a.match_id,
                a.selection,
                a.win_probability,
                a.market_odds,
                a.ev,
                a.true_edge,
                a.risk_level,
                a.classification,
                a.kelly_fraction,
                a.created_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_recent_analyses(&self, limit: i64) -> Result<Vec<StoredAnalysis>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, match_id, selection, win_probability, market_odds, ev,
                    true_edge, risk_level, classification, kelly_fraction, created_at
             FROM analysis_results ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(StoredAnalysis {
                    id: row.get(0)?,
                    match_id: row.get(1)?,
                    selection: row.get(2)?,
                    win_probability: row.get(3)?,
                    market_odds: row.get(4)?,
                    ev: row.get(5)?,
                    true_edge: row.get(6)?,
                    risk_level: row.get(7)?,
                    classification: row.get(8)?,
                    kelly_fraction: row.get(9)?,
                    created_at: row.get(10)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl HistoryProvider for Database {
    fn player_history(&self, player_id: &str, limit: usize) -> Result<MatchHistory> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT date, surface, winner_name, score FROM matches
             WHERE (player_a_id = ?1 OR player_b_id = ?1) AND status = 'finished'
             ORDER BY date DESC LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(params![player_id, limit as i64], map_history_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(MatchHistory::newest_first(entries))
    }

    fn head_to_head(&self, player_a_id: &str, player_b_id: &str) -> Result<Vec<MatchHistoryEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT date, surface, winner_name, score FROM matches
             WHERE ((player_a_id = ?1 AND player_b_id = ?2)
                 OR (player_a_id = ?2 AND player_b_id = ?1))
               AND status = 'finished'
             ORDER BY date DESC",
        )?;
        let entries = stmt
            .query_map(params![player_a_id, player_b_id], map_history_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn upsert_player_on(conn: &Connection, p: &Player) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO players (id, name, ranking) VALUES (?1,?2,?3)
         ON CONFLICT(id) DO UPDATE SET name=excluded.name, ranking=excluded.ranking",
        params![p.id, p.name, p.ranking],
    )
}

fn upsert_match_on(conn: &Connection, m: &MatchRow) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO matches (id, tournament, tournament_level, surface, date,
                              player_a_id, player_b_id, status, winner_name, score,
                              odds_a, odds_b, opening_odds_a, opening_odds_b)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)
         ON CONFLICT(id) DO UPDATE SET
            tournament=excluded.tournament,
            tournament_level=excluded.tournament_level,
            surface=excluded.surface,
            date=excluded.date,
            status=excluded.status,
            winner_name=excluded.winner_name,
            score=excluded.score,
            odds_a=excluded.odds_a,
            odds_b=excluded.odds_b,
            opening_odds_a=COALESCE(matches.opening_odds_a, excluded.opening_odds_a),
            opening_odds_b=COALESCE(matches.opening_odds_b, excluded.opening_odds_b)",
        params![
            m.id,
            m.tournament,
            m.tournament_level.map(|l| l.to_string()),
            m.surface,
            m.date,
            m.player_a_id,
            m.player_b_id,
            m.status,
            m.winner_name,
            m.score,
            m.odds_a,
            m.odds_b,
            m.opening_odds_a,
            m.opening_odds_b,
        ],
    )
}

const MATCH_SELECT: &str = "SELECT m.id, m.tournament, m.tournament_level, m.surface, m.date,
        a.id, a.name, a.ranking, b.id, b.name, b.ranking,
        m.status, m.winner_name, m.score,
        m.odds_a, m.odds_b, m.opening_odds_a, m.opening_odds_b
     FROM matches m
     JOIN players a ON a.id = m.player_a_id
     JOIN players b ON b.id = m.player_b_id";

fn map_match(row: &rusqlite::Row) -> rusqlite::Result<Match> {
    let level: Option<String> = row.get(2)?;
    Ok(Match {
        id: row.get(0)?,
        tournament: row.get(1)?,
        tournament_level: level.and_then(|l| l.parse::<TournamentLevel>().ok()),
        surface: row.get(3)?,
        date: row.get::<_, NaiveDate>(4)?,
        player_a: Player {
            id: row.get(5)?,
            name: row.get(6)?,
            ranking: row.get(7)?,
        },
        player_b: Player {
            id: row.get(8)?,
            name: row.get(9)?,
            ranking: row.get(10)?,
        },
        status: row.get(11)?,
        winner_name: row.get(12)?,
        score: row.get(13)?,
        odds_a: row.get(14)?,
        odds_b: row.get(15)?,
        opening_odds_a: row.get(16)?,
        opening_odds_b: row.get(17)?,
    })
}

fn map_history_entry(row: &rusqlite::Row) -> rusqlite::Result<MatchHistoryEntry> {
    Ok(MatchHistoryEntry {
        date: row.get(0)?,
        surface: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        winner_name: row.get(2)?,
        score: row.get(3)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    id          TEXT    PRIMARY KEY,
    name        TEXT    NOT NULL,
    ranking     INTEGER
);

CREATE TABLE IF NOT EXISTS matches (
    id               TEXT    PRIMARY KEY,
    tournament       TEXT    NOT NULL,
    tournament_level TEXT,
    surface          TEXT    NOT NULL DEFAULT '',
    date             TEXT    NOT NULL,
    player_a_id      TEXT    NOT NULL,
    player_b_id      TEXT    NOT NULL,
    status           TEXT    NOT NULL DEFAULT 'scheduled',
    winner_name      TEXT,
    score            TEXT,
    odds_a           REAL,
    odds_b           REAL,
    opening_odds_a   REAL,
    opening_odds_b   REAL,
    FOREIGN KEY (player_a_id) REFERENCES players(id),
    FOREIGN KEY (player_b_id) REFERENCES players(id)
);

CREATE TABLE IF NOT EXISTS analysis_results (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    match_id        TEXT    NOT NULL,
    selection       TEXT    NOT NULL,
    win_probability REAL    NOT NULL,
    market_odds     REAL    NOT NULL,
    ev              REAL    NOT NULL,
    true_edge       REAL    NOT NULL,
    risk_level      TEXT    NOT NULL,
    classification  TEXT    NOT NULL,
    kelly_fraction  REAL    NOT NULL,
    created_at      TEXT    NOT NULL,
    FOREIGN KEY (match_id) REFERENCES matches(id)
);

CREATE INDEX IF NOT EXISTS idx_matches_player_a ON matches(player_a_id, date);
CREATE INDEX IF NOT EXISTS idx_matches_player_b ON matches(player_b_id, date);
CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(status, date);
CREATE INDEX IF NOT EXISTS idx_analysis_match ON analysis_results(match_id);
"#;
