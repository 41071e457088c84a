use clap::{Parser, Subcommand};

use crate::engine::EngineSettings;
use crate::quant::QuantConfig;

/// Tennis match scoring and value-bet analysis
#[derive(Parser, Debug, Clone)]
#[command(name = "tennis-quant", version, about)]
pub struct Config {
    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "tennis_quant.db")]
    pub database_path: String,

    /// HTTP API listen address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8080")]
    pub api_addr: String,

    /// Bankroll used for stake sizing (currency units)
    #[arg(long, env = "BANKROLL", default_value = "1000.0")]
    pub bankroll: f64,

    /// Haircut applied to Kelly stakes for correlated bets (0.0–1.0)
    #[arg(long, env = "CORRELATION_PENALTY", default_value = "0.0")]
    pub correlation_penalty: f64,

    /// Trading days per Monte Carlo path
    #[arg(long, env = "SIM_DAYS", default_value = "250")]
    pub sim_days: usize,

    /// Number of Monte Carlo paths
    #[arg(long, env = "SIM_PATHS", default_value = "20")]
    pub sim_paths: usize,

    /// Base RNG seed for reproducible simulations
    #[arg(long, env = "SIM_SEED")]
    pub sim_seed: Option<u64>,

    /// Minimum expected value for a scan hit (e.g. 0.02 = 2%)
    #[arg(long, env = "MIN_EV_ALERT", default_value = "0.02")]
    pub min_ev_alert: f64,

    /// Decimal odds assumed when a match has none stored
    #[arg(long, env = "DEFAULT_MARKET_ODDS", default_value = "1.90")]
    pub default_market_odds: f64,

    /// Past matches loaded per player
    #[arg(long, env = "HISTORY_LIMIT", default_value = "50")]
    pub history_limit: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze both sides of one stored match
    Analyze {
        match_id: String,
    },
    /// Analyze scheduled matches and report value bets
    Scan {
        #[arg(long, default_value = "100")]
        limit: i64,
    },
    /// Serve the JSON API
    Serve,
    /// Run a standalone Monte Carlo bankroll simulation
    Simulate {
        #[arg(long)]
        win_rate: f64,
        #[arg(long)]
        odds: f64,
        #[arg(long, default_value = "3")]
        trades_per_day: usize,
        /// Overrides SIM_DAYS
        #[arg(long)]
        days: Option<usize>,
    },
    /// Load players and matches from a JSON file
    Import {
        path: String,
    },
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.bankroll > 0.0) {
            anyhow::bail!("bankroll must be positive");
        }
        if !(0.0..=1.0).contains(&self.correlation_penalty) {
            anyhow::bail!("correlation_penalty must be between 0.0 and 1.0");
        }
        if !(self.default_market_odds > 1.0) {
            anyhow::bail!("default_market_odds must be greater than 1.0");
        }
        if self.history_limit == 0 {
            anyhow::bail!("history_limit must be at least 1");
        }
        if let Command::Simulate { win_rate, odds, .. } = &self.command {
            if !(0.0..=1.0).contains(win_rate) {
                anyhow::bail!("win_rate must be between 0.0 and 1.0");
            }
            if !(*odds > 1.0) {
                anyhow::bail!("odds must be greater than 1.0");
            }
        }
        Ok(())
    }

    /// Pipeline parameters with the simulation overrides applied.
    pub fn quant_config(&self) -> anyhow::Result<QuantConfig> {
        let mut quant = QuantConfig::default();
        quant.simulation.days = self.sim_days;
        quant.simulation.paths = self.sim_paths;
        quant.simulation.seed = self.sim_seed;
        if let Command::Simulate {
            trades_per_day,
            days,
            ..
        } = &self.command
        {
            quant.simulation.trades_per_day = *trades_per_day;
            if let Some(days) = days {
                quant.simulation.days = *days;
            }
        }
        quant.validate()?;
        Ok(quant)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            history_limit: self.history_limit,
            bankroll: self.bankroll,
            correlation_penalty: self.correlation_penalty,
            default_odds: self.default_market_odds,
            min_ev_alert: self.min_ev_alert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("tennis-quant").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let config = parse(&["scan"]);
        config.validate().unwrap();
        let quant = config.quant_config().unwrap();
        assert_eq!(quant.simulation.paths, 20);
        assert_eq!(config.engine_settings(), EngineSettings::default());
    }

    #[test]
    fn simulate_overrides_days_and_trades() {
        let config = parse(&[
            "--sim-seed", "7", "simulate", "--win-rate", "0.55", "--odds", "2.0",
            "--trades-per-day", "5", "--days", "30",
        ]);
        config.validate().unwrap();
        let sim = config.quant_config().unwrap().simulation;
        assert_eq!(sim.days, 30);
        assert_eq!(sim.trades_per_day, 5);
        assert_eq!(sim.seed, Some(7));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(&["--correlation-penalty", "1.5", "scan"]).validate().is_err());
        assert!(parse(&["--default-market-odds", "1.0", "scan"]).validate().is_err());
        assert!(parse(&["simulate", "--win-rate", "1.2", "--odds", "2.0"]).validate().is_err());
        assert!(parse(&["--sim-paths", "0", "serve"]).quant_config().is_err());
    }
}
