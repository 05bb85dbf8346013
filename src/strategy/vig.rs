//! Market-implied probabilities.
//!
//! Converts decimal odds to implied probabilities and strips the
//! bookmaker margin from two-way markets by proportional normalisation.

use tracing::trace;

use crate::types::CandidateRow;

/// Where a market probability came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSource {
    /// Both sides' best odds, normalised to sum to one.
    VigFree,
    /// Probability supplied by the upstream feed.
    Supplied,
    /// `1 / odds` of the offered price, margin included.
    Reciprocal,
}

/// Implied probability of decimal odds. `None` for odds that are not > 1.
pub fn implied_prob(odds: f64) -> Option<f64> {
    if odds.is_finite() && odds > 1.0 {
        Some(1.0 / odds)
    } else {
        None
    }
}

/// Remove the margin from a two-way market.
///
/// Returns `(p_a, p_b)` summing to one, or `None` if either price is
/// unusable.
pub fn vig_free_pair(odds_a: f64, odds_b: f64) -> Option<(f64, f64)> {
    let ia = implied_prob(odds_a)?;
    let ib = implied_prob(odds_b)?;
    let overround = ia + ib;
    if overround <= 0.0 {
        return None;
    }
    Some((ia / overround, ib / overround))
}

/// Estimate the market probability for the row's own side.
///
/// Priority: vig-free two-sided odds, then a supplied market probability,
/// then the naive reciprocal of the offered odds.
pub fn market_prob(row: &CandidateRow) -> Option<(f64, MarketSource)> {
    if let (Some(own), Some(other)) = (row.best_odds_player, row.best_odds_opponent) {
        if let Some((p, _)) = vig_free_pair(own, other) {
            return Some((p, MarketSource::VigFree));
        }
        trace!(player = %row.player, own, other, "Two-sided odds unusable, falling back");
    }

    if let Some(p) = row.market_prob {
        return Some((clamp01(p), MarketSource::Supplied));
    }

    implied_prob(row.best_odds).map(|p| (p, MarketSource::Reciprocal))
}

/// Model probability: explicit model estimate first, pre-blended value second.
pub fn model_prob(row: &CandidateRow) -> Option<f64> {
    row.model_prob.or(row.blended_prob).map(clamp01)
}

pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implied_prob() {
        assert_eq!(implied_prob(2.0), Some(0.5));
        assert_eq!(implied_prob(1.0), None);
        assert_eq!(implied_prob(0.5), None);
        assert_eq!(implied_prob(f64::INFINITY), None);
    }

    #[test]
    fn test_vig_free_pair_sums_to_one() {
        for (a, b) in [(1.80, 2.10), (1.25, 4.00), (2.00, 2.00), (1.01, 26.0), (3.4, 1.33)] {
            let (pa, pb) = vig_free_pair(a, b).unwrap();
            assert!((pa + pb - 1.0).abs() < 1e-12, "{a}/{b} -> {pa}+{pb}");
            assert!(pa > 0.0 && pb > 0.0);
        }
    }

    #[test]
    fn test_vig_free_removes_margin() {
        // 1.90 / 1.90 carries ~5% overround; fair price is 50/50.
        let (pa, pb) = vig_free_pair(1.90, 1.90).unwrap();
        assert!((pa - 0.5).abs() < 1e-12);
        assert!((pb - 0.5).abs() < 1e-12);
        assert!(implied_prob(1.90).unwrap() > pa);
    }

    #[test]
    fn test_vig_free_pair_rejects_bad_odds() {
        assert!(vig_free_pair(1.0, 2.0).is_none());
        assert!(vig_free_pair(2.0, 0.0).is_none());
    }

    #[test]
    fn test_market_prob_prefers_two_sided() {
        let mut row = CandidateRow::sample("A", "B", 2.50);
        row.best_odds_player = Some(2.50);
        row.best_odds_opponent = Some(1.55);
        row.market_prob = Some(0.10);

        let (p, src) = market_prob(&row).unwrap();
        assert_eq!(src, MarketSource::VigFree);
        let expected = (1.0 / 2.50) / (1.0 / 2.50 + 1.0 / 1.55);
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn test_market_prob_uses_supplied_when_one_side_missing() {
        let mut row = CandidateRow::sample("A", "B", 2.50);
        row.best_odds_player = Some(2.50);
        row.market_prob = Some(0.38);

        assert_eq!(market_prob(&row), Some((0.38, MarketSource::Supplied)));
    }

    #[test]
    fn test_market_prob_supplied_after_bad_two_sided() {
        let mut row = CandidateRow::sample("A", "B", 2.50);
        row.best_odds_player = Some(2.50);
        row.best_odds_opponent = Some(0.0);
        row.market_prob = Some(0.38);

        assert_eq!(market_prob(&row).unwrap().1, MarketSource::Supplied);
    }

    #[test]
    fn test_market_prob_reciprocal_fallback() {
        let row = CandidateRow::sample("A", "B", 2.50);
        assert_eq!(market_prob(&row), Some((0.4, MarketSource::Reciprocal)));

        let row = CandidateRow::sample("A", "B", 1.0);
        assert_eq!(market_prob(&row), None);
    }

    #[test]
    fn test_model_prob_priority() {
        let mut row = CandidateRow::sample("A", "B", 2.0);
        assert_eq!(model_prob(&row), None);

        row.blended_prob = Some(0.55);
        assert_eq!(model_prob(&row), Some(0.55));

        row.model_prob = Some(0.61);
        assert_eq!(model_prob(&row), Some(0.61));

        row.model_prob = Some(1.4);
        assert_eq!(model_prob(&row), Some(1.0));
    }
}
