use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::engine::AnalysisEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: AnalysisEngine,
}

/// Build the Axum router for the JSON API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/matches", get(matches_handler))
        .route("/api/matches/:id/analysis", get(analysis_handler))
        .route("/api/players/:id/metrics", get(player_metrics_handler))
        .route("/api/analyses", get(analyses_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[derive(Debug, Deserialize)]
struct MatchesQuery {
    #[serde(default = "default_status")]
    status: String,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_status() -> String {
    "scheduled".into()
}

fn default_limit() -> i64 {
    50
}

/// GET /api/matches?status=scheduled&limit=50
async fn matches_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<MatchesQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .engine
        .database()
        .list_matches(&q.status, q.limit)
        .map(Json)
        .map_err(internal)
}

/// GET /api/matches/:id/analysis
async fn analysis_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.engine.analyze_by_id(&id).map_err(internal)? {
        Some(sides) => Ok(Json(sides)),
        None => Err((StatusCode::NOT_FOUND, format!("match {id} not found"))),
    }
}

#[derive(Debug, Deserialize)]
struct MetricsQuery {
    #[serde(default)]
    surface: String,
}

/// GET /api/players/:id/metrics?surface=Clay
async fn player_metrics_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<MetricsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if q.surface.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "surface is required".into()));
    }
    let player = state
        .engine
        .database()
        .get_player(&id)
        .map_err(internal)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("player {id} not found")))?;
    state
        .engine
        .player_metrics(&player, &q.surface, None)
        .map(Json)
        .map_err(internal)
}

/// GET /api/analyses
async fn analyses_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .engine
        .database()
        .list_recent_analyses(100)
        .map(Json)
        .map_err(internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::db::models::{ImportFile, MatchRow, Player};
    use crate::db::Database;
    use crate::engine::EngineSettings;
    use crate::quant::QuantConfig;

    fn player(id: &str, name: &str, ranking: i64) -> Player {
        Player {
            id: id.into(),
            name: name.into(),
            ranking: Some(ranking),
        }
    }

    fn row(id: &str, status: &str, date: &str, winner: Option<&str>) -> MatchRow {
        MatchRow {
            id: id.into(),
            tournament: "Madrid Masters".into(),
            tournament_level: None,
            surface: "Clay".into(),
            date: date.parse::<NaiveDate>().unwrap(),
            player_a_id: "p1".into(),
            player_b_id: "p2".into(),
            status: status.into(),
            winner_name: winner.map(Into::into),
            score: winner.map(|_| "6-4 7-5".into()),
            odds_a: None,
            odds_b: None,
            opening_odds_a: None,
            opening_odds_b: None,
        }
    }

    fn app() -> Router {
        let db = Database::open(":memory:").unwrap();
        let mut upcoming = row("m3", "scheduled", "2024-05-01", None);
        upcoming.odds_a = Some(1.7);
        upcoming.odds_b = Some(2.2);
        db.import(&ImportFile {
            players: vec![player("p1", "Jannik Sinner", 1), player("p2", "Carlos Alcaraz", 3)],
            matches: vec![
                row("m1", "finished", "2024-03-01", Some("Jannik Sinner")),
                row("m2", "finished", "2024-04-01", Some("Carlos Alcaraz")),
                upcoming,
            ],
        })
        .unwrap();
        let mut quant = QuantConfig::default();
        quant.simulation.seed = Some(3);
        quant.simulation.days = 10;
        router(AppState {
            engine: AnalysisEngine::new(db, quant, EngineSettings::default()),
        })
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn lists_scheduled_matches() {
        let (status, body) = get("/api/matches").await;
        assert_eq!(status, StatusCode::OK);
        let matches = body.as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["id"], "m3");
        assert_eq!(matches[0]["player_a"]["name"], "Jannik Sinner");

        let (_, body) = get("/api/matches?status=finished&limit=1").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn analyzes_both_sides_of_known_match() {
        let (status, body) = get("/api/matches/m3/analysis").await;
        assert_eq!(status, StatusCode::OK);
        let sides = body.as_array().unwrap();
        assert_eq!(sides.len(), 2);
        assert_eq!(sides[0]["selection"], "Jannik Sinner");
        assert_eq!(sides[1]["selection"], "Carlos Alcaraz");
        assert_eq!(sides[0]["result"]["tournament_level"], "Masters1000");
        let p = sides[0]["result"]["win_probability"].as_f64().unwrap()
            + sides[1]["result"]["win_probability"].as_f64().unwrap();
        assert!((p - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let (status, _) = get("/api/matches/missing/analysis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn returns_player_metrics() {
        let (status, body) = get("/api/players/p1/metrics?surface=Clay").await;
        assert_eq!(status, StatusCode::OK);
        // one win in two clay matches with a Beta(2,2) prior
        assert!((body["surface_win_rate"].as_f64().unwrap() - 0.5).abs() < 1e-12);
        assert!(body["form"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn metrics_need_known_player_and_surface() {
        let (status, _) = get("/api/players/p1/metrics").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get("/api/players/p9/metrics?surface=Clay").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lists_recent_analyses() {
        let (status, body) = get("/api/analyses").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }
}
