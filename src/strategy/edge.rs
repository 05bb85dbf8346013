//! Per-row value assessment.
//!
//! Blends market and model probabilities by confidence, derives edge,
//! EV and Kelly, bands the odds and applies the inclusion thresholds.

use tracing::debug;

use super::kelly::{expected_value, kelly_fraction};
use super::vig::{market_prob, model_prob, MarketSource};
use crate::config::FilterConfig;
use crate::types::{CandidateRow, OddsBand, Pick};

/// Weight given to the model probability for a confidence score.
///
/// Quadratic in `confidence / 100`, so low confidence counts for much
/// less than a linear weight would give it. Always in [0, 1].
pub fn blend_weight(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return 0.0;
    }
    let c = (confidence / 100.0).clamp(0.0, 1.0);
    c * c
}

/// Convex combination of market and model probability.
pub fn blend(p_market: f64, p_model: f64, confidence: f64) -> f64 {
    let lam = blend_weight(confidence);
    (1.0 - lam) * p_market + lam * p_model
}

/// Every derived metric for a row, before any threshold is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub p_market: f64,
    pub market_source: MarketSource,
    pub p_model: f64,
    pub lam: f64,
    pub p_sane: f64,
    pub edge: f64,
    pub ev: f64,
    pub kelly: f64,
    pub band: OddsBand,
}

/// Compute the metrics for a row. `None` when no market or model
/// probability can be derived.
pub fn assess(row: &CandidateRow, config: &FilterConfig) -> Option<Assessment> {
    let (p_market, market_source) = market_prob(row)?;
    let p_model = model_prob(row)?;
    let lam = blend_weight(row.confidence);
    let p_sane = blend(p_market, p_model, row.confidence);

    Some(Assessment {
        p_market,
        market_source,
        p_model,
        lam,
        p_sane,
        edge: p_sane - p_market,
        ev: expected_value(row.best_odds, p_sane),
        kelly: kelly_fraction(row.best_odds, p_sane),
        band: config.band_for(row.best_odds),
    })
}

/// Why a row was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoProbability,
    OutsideBands,
    EdgeTooSmall,
    EvTooSmall,
    KellyTooSmall,
}

/// Apply the inclusion rule to a row.
pub fn check(row: &CandidateRow, config: &FilterConfig) -> Result<Pick, Rejection> {
    let a = assess(row, config).ok_or(Rejection::NoProbability)?;

    let min_kelly = config.min_kelly_for(a.band).ok_or(Rejection::OutsideBands)?;
    if a.edge < config.min_edge {
        return Err(Rejection::EdgeTooSmall);
    }
    if a.ev < config.min_ev {
        return Err(Rejection::EvTooSmall);
    }
    if a.kelly < min_kelly {
        return Err(Rejection::KellyTooSmall);
    }

    Ok(Pick {
        tour: row.tour,
        band: a.band,
        player: row.player.clone(),
        opponent: row.opponent.clone(),
        odds: row.best_odds,
        p_market: a.p_market,
        p_sane: a.p_sane,
        edge: a.edge,
        ev: a.ev,
        kelly: a.kelly,
        commence_time: row.commence_time,
    })
}

/// Pure per-row filter: the pick if the row qualifies.
pub fn evaluate(row: &CandidateRow, config: &FilterConfig) -> Option<Pick> {
    match check(row, config) {
        Ok(pick) => Some(pick),
        Err(reason) => {
            debug!(
                player = %row.player,
                opponent = %row.opponent,
                odds = row.best_odds,
                reason = ?reason,
                "Row rejected"
            );
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
