use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::net::SocketAddr;
use tracing::info;

mod api;
mod config;
mod db;
mod engine;
mod provider;
mod quant;

use config::{Command, Config};
use db::models::ImportFile;
use db::Database;
use engine::AnalysisEngine;
use quant::portfolio::simulate_portfolio;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;
    let quant = config.quant_config()?;

    match &config.command {
        // Simulation needs no database
        Command::Simulate { win_rate, odds, .. } => {
            info!(
                "Simulating {} path(s) × {} day(s) at p={:.3}, odds {:.2}",
                quant.simulation.paths, quant.simulation.days, win_rate, odds
            );
            print_json(&simulate_portfolio(*win_rate, *odds, &quant.simulation))?;
        }
        Command::Import { path } => {
            let db = open_database(&config)?;
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading import file {path}"))?;
            let file: ImportFile =
                serde_json::from_str(&raw).with_context(|| format!("parsing import file {path}"))?;
            let (players, matches) = db.import(&file)?;
            info!("Imported {} player(s) and {} match(es) from {}", players, matches, path);
        }
        Command::Analyze { match_id } => {
            let engine = AnalysisEngine::new(open_database(&config)?, quant, config.engine_settings());
            match engine.analyze_by_id(match_id)? {
                Some(sides) => print_json(&sides)?,
                None => anyhow::bail!("match {match_id} not found"),
            }
        }
        Command::Scan { limit } => {
            let engine = AnalysisEngine::new(open_database(&config)?, quant, config.engine_settings());
            let hits = engine.scan(*limit)?;
            info!("{} value bet(s) found", hits.len());
            print_json(&hits)?;
        }
        Command::Serve => {
            let engine = AnalysisEngine::new(open_database(&config)?, quant, config.engine_settings());
            let app = api::router(api::AppState { engine });
            let addr: SocketAddr = config.api_addr.parse()?;
            info!("API listening on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn open_database(config: &Config) -> Result<Database> {
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);
    Ok(db)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
