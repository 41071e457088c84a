use anyhow::Result;

use crate::quant::{MatchHistory, MatchHistoryEntry};

/// Source of past results for metric extraction.
///
/// Implementations return an empty history, not an error, for players
/// with no recorded matches.
pub trait HistoryProvider: Send + Sync {
    /// Up to `limit` finished matches involving the player, newest first.
    fn player_history(&self, player_id: &str, limit: usize) -> Result<MatchHistory>;

    /// Every finished match between the two players, in either orientation.
    fn head_to_head(&self, player_a_id: &str, player_b_id: &str) -> Result<Vec<MatchHistoryEntry>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
