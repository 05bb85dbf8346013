//! Shared types for the value-pick pipeline.
//!
//! Candidate rows come in from the CSV loader, picks go out to the
//! report writer. Everything here lives for a single run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Tennis tour a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Tour {
    #[serde(rename = "ATP")]
    Atp,
    #[serde(rename = "WTA")]
    Wta,
}

impl Tour {
    /// Report order.
    pub const ALL: [Tour; 2] = [Tour::Atp, Tour::Wta];

    /// Parse a tour label case-insensitively. Unknown labels yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ATP" => Some(Tour::Atp),
            "WTA" => Some(Tour::Wta),
            _ => None,
        }
    }
}

impl fmt::Display for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tour::Atp => write!(f, "ATP"),
            Tour::Wta => write!(f, "WTA"),
        }
    }
}

/// Odds band a price falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OddsBand {
    Favorite,
    Underdog,
    Excluded,
}

impl fmt::Display for OddsBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OddsBand::Favorite => write!(f, "Favorites"),
            OddsBand::Underdog => write!(f, "Underdogs"),
            OddsBand::Excluded => write!(f, "Excluded"),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate row
// ---------------------------------------------------------------------------

/// One proposed bet as read from the candidate CSV.
///
/// Required fields are plain values; a row missing any of them never
/// makes it out of the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    pub tour: Tour,
    pub player: String,
    pub opponent: String,
    /// Best decimal odds on offer for `player`.
    pub best_odds: f64,
    /// Best odds on each side of the match, when the feed carried both.
    pub best_odds_player: Option<f64>,
    pub best_odds_opponent: Option<f64>,
    /// Market-implied probability supplied upstream.
    pub market_prob: Option<f64>,
    /// Model probability (Elo-derived upstream).
    pub model_prob: Option<f64>,
    /// Upstream pre-blended probability, used when `model_prob` is absent.
    pub blended_prob: Option<f64>,
    /// Confidence score, nominally 0–100.
    pub confidence: f64,
    pub commence_time: DateTime<Utc>,
}

impl CandidateRow {
    /// Build a row with sensible defaults for tests.
    #[cfg(test)]
    pub fn sample(player: &str, opponent: &str, odds: f64) -> Self {
        CandidateRow {
            tour: Tour::Atp,
            player: player.to_string(),
            opponent: opponent.to_string(),
            best_odds: odds,
            best_odds_player: None,
            best_odds_opponent: None,
            market_prob: None,
            model_prob: None,
            blended_prob: None,
            confidence: 100.0,
            commence_time: Utc::now() + chrono::Duration::hours(3),
        }
    }
}

// ---------------------------------------------------------------------------
// Pick
// ---------------------------------------------------------------------------

/// A candidate row that passed every inclusion threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pick {
    pub tour: Tour,
    pub band: OddsBand,
    pub player: String,
    pub opponent: String,
    pub odds: f64,
    pub p_market: f64,
    pub p_sane: f64,
    pub edge: f64,
    pub ev: f64,
    pub kelly: f64,
    #[serde(rename = "commence_time_utc")]
    pub commence_time: DateTime<Utc>,
}

impl Pick {
    /// Ranking key: higher probability first, Kelly breaks ties.
    pub fn rank_key(&self) -> (f64, f64) {
        (self.p_sane, self.kelly)
    }

    /// Unordered match key: the same match seen from either side maps to
    /// the same key.
    pub fn match_key(&self) -> (String, String) {
        if self.player <= self.opponent {
            (self.player.clone(), self.opponent.clone())
        } else {
            (self.opponent.clone(), self.player.clone())
        }
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}] {} vs {} @ {:.2} (p={:.3}, Kelly={:.3}, EV={:+.3})",
            self.tour,
            self.band,
            self.player,
            self.opponent,
            self.odds,
            self.p_sane,
            self.kelly,
            self.ev,
        )
    }
}

// ---------------------------------------------------------------------------
// Run outcome
// ---------------------------------------------------------------------------

/// Why a run finished without producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoDataReason {
    /// The candidate CSV does not exist.
    MissingInput,
    /// The CSV header lacks required columns.
    MissingColumns(Vec<String>),
    /// No usable row starts inside the lookahead window.
    NoRowsInWindow,
    /// Rows were in the window but none cleared the thresholds.
    NoQualifyingPicks,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::MissingInput => write!(f, "input file not found"),
            NoDataReason::MissingColumns(cols) => {
                write!(f, "missing required columns: {}", cols.join(", "))
            }
            NoDataReason::NoRowsInWindow => write!(f, "no matches inside the lookahead window"),
            NoDataReason::NoQualifyingPicks => write!(f, "no candidate cleared the thresholds"),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Markdown was produced for this many picks.
    Published { picks: usize },
    /// Nothing to publish; not a failure.
    NoData(NoDataReason),
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Genuine failures, as opposed to "nothing to report".
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Job summary path not set: environment variable {0} is missing or empty")]
    SummaryPathUnset(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
