//! Kelly Criterion stake sizing for decimal odds.
//!
//! The Kelly formula sizes a bet to maximise the expected logarithm of wealth,
//! which balances risk and reward optimally over the long run.
//!
//! For decimal odds `o` (stake included) and win probability `p`:
//!   f* = (p·o − 1) / (o − 1)
//!
//! The full fraction is dampened by a correlation penalty for concurrent
//! exposures on related outcomes, then cut to quarter Kelly.

/// Fixed fractional-Kelly policy. Not user configurable.
pub const KELLY_MULTIPLIER: f64 = 0.25;

/// Full Kelly fraction of bankroll. Returns `0.0` when there is no edge
/// (`p·o ≤ 1`) or the odds cannot pay out (`o ≤ 1`).
pub fn kelly_fraction(win_prob: f64, odds: f64) -> f64 {
    if odds <= 1.0 {
        return 0.0;
    }
    let f = (win_prob * odds - 1.0) / (odds - 1.0);
    if !f.is_finite() || f <= 0.0 {
        return 0.0; // never bet negative Kelly
    }
    f
}

/// Currency stake for one bet.
///
/// # Arguments
/// * `win_prob`            – Model probability that the bet wins (0.0–1.0).
/// * `odds`                – Decimal odds offered.
/// * `bankroll`            – Current bankroll in currency units.
/// * `correlation_penalty` – Share of the stake removed for correlated
///                           exposure (0.0–1.0).
pub fn portfolio_kelly_stake(
    win_prob: f64,
    odds: f64,
    bankroll: f64,
    correlation_penalty: f64,
) -> f64 {
    let f = kelly_fraction(win_prob, odds);
    if f == 0.0 {
        return 0.0;
    }
    let dampened = f * (1.0 - correlation_penalty.clamp(0.0, 1.0));
    dampened * KELLY_MULTIPLIER * bankroll
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kelly_no_edge() {
        // Fair price: p·o = 1
        assert_eq!(kelly_fraction(0.5, 2.0), 0.0);
        assert_eq!(portfolio_kelly_stake(0.5, 2.0, 1000.0, 0.0), 0.0);
    }

    #[test]
    fn test_kelly_positive_edge() {
        // p = 0.6, o = 2.0 → f = (1.2 − 1) / 1 = 0.2
        assert_relative_eq!(kelly_fraction(0.6, 2.0), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_quarter_kelly_stake() {
        let stake = portfolio_kelly_stake(0.6, 2.0, 1000.0, 0.0);
        assert_relative_eq!(stake, 0.2 * 0.25 * 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_correlation_penalty_dampens() {
        let stake = portfolio_kelly_stake(0.6, 2.0, 1000.0, 0.5);
        assert_relative_eq!(stake, 25.0, epsilon = 1e-9);
        assert_eq!(portfolio_kelly_stake(0.6, 2.0, 1000.0, 1.0), 0.0);
    }

    #[test]
    fn test_kelly_negative_edge() {
        assert_eq!(portfolio_kelly_stake(0.3, 2.5, 1000.0, 0.0), 0.0);
        assert_eq!(portfolio_kelly_stake(0.38, 2.5, 1000.0, 0.0), 0.0);
    }

    #[test]
    fn test_kelly_invalid_odds() {
        for odds in [1.0, 0.5, 0.0, -3.0] {
            assert_eq!(portfolio_kelly_stake(0.9, odds, 1000.0, 0.0), 0.0);
        }
    }

    #[test]
    fn test_kelly_nan_probability() {
        assert_eq!(kelly_fraction(f64::NAN, 2.0), 0.0);
    }
}
