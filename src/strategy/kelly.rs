//! Kelly fraction and expected value at decimal odds.
//!
//! No staking happens here: the Kelly fraction is only a signal used by
//! the inclusion rule and shown in the shortlist.

/// Kelly value returned for odds that can never be bet (`odds <= 1`).
pub const NEVER_BET: f64 = -1.0;

/// Kelly fraction for probability `p` at decimal `odds`.
///
/// k = (odds * p - (1 - p)) / (odds - 1)
///
/// Returns [`NEVER_BET`] when `odds <= 1`. Negative values are kept so the
/// caller can tell how far below a floor a row sits.
pub fn kelly_fraction(odds: f64, p: f64) -> f64 {
    if odds.is_nan() || odds <= 1.0 {
        return NEVER_BET;
    }
    (odds * p - (1.0 - p)) / (odds - 1.0)
}

/// Expected profit per unit staked.
pub fn expected_value(odds: f64, p: f64) -> f64 {
    odds * p - 1.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
