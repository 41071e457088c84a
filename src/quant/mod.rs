pub mod analysis;
pub mod decision;
pub mod kelly;
pub mod market;
pub mod metrics;
pub mod params;
pub mod portfolio;
pub mod score;
pub mod win_probability;

pub use analysis::{analyze_match_deep, AnalysisRequest, AnalysisResult, PlayerInput};
pub use market::TournamentLevel;
pub use metrics::{MatchHistory, MatchHistoryEntry, PlayerMetrics};
pub use params::QuantConfig;
pub use score::MatchContext;
