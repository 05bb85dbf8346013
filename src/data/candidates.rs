//! Candidate CSV ingestion.
//!
//! The upstream pipeline writes one row per proposed bet. Column names are
//! matched case-insensitively; numeric or timestamp fields that do not
//! parse are treated as missing and the row is dropped.

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::types::{CandidateRow, NoDataReason, Tour, ValueError};

/// Naive timestamp layouts accepted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Result of reading the candidate file.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    Rows {
        rows: Vec<CandidateRow>,
        /// Rows skipped for missing or malformed values.
        dropped: usize,
    },
    NoData(NoDataReason),
}

/// Header positions of the columns we read.
#[derive(Debug, Clone, Copy)]
struct Columns {
    tour: usize,
    player: usize,
    opponent: usize,
    best_odds: usize,
    confidence: usize,
    commence_time: usize,
    model_prob: Option<usize>,
    blended_prob: Option<usize>,
    market_prob: Option<usize>,
    best_odds_player: Option<usize>,
    best_odds_opponent: Option<usize>,
}

impl Columns {
    /// Resolve header names, or list the required ones that are missing.
    fn resolve(headers: &StringRecord) -> Result<Self, Vec<String>> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
        };

        let mut missing = Vec::new();
        let mut required = |name: &str| {
            let idx = find(name);
            if idx.is_none() {
                missing.push(name.to_string());
            }
            idx
        };

        let tour = required("tour");
        let player = required("player");
        let opponent = required("opponent");
        let best_odds = required("best_odds");
        let confidence = required("confidence");
        let commence_time = required("commence_time_utc");

        let model_prob = find("model_prob");
        let blended_prob = find("blended_prob");
        if model_prob.is_none() && blended_prob.is_none() {
            missing.push("blended_prob or model_prob".to_string());
        }

        match (tour, player, opponent, best_odds, confidence, commence_time) {
            (
                Some(tour),
                Some(player),
                Some(opponent),
                Some(best_odds),
                Some(confidence),
                Some(commence_time),
            ) if missing.is_empty() => {
                Ok(Columns {
                    tour,
                    player,
                    opponent,
                    best_odds,
                    confidence,
                    commence_time,
                    model_prob,
                    blended_prob,
                    market_prob: find("market_prob"),
                    best_odds_player: find("best_odds_player"),
                    best_odds_opponent: find("best_odds_opponent"),
                })
            }
            _ => Err(missing),
        }
    }
}

// ---------------------------------------------------------------------------
// Field coercion
// ---------------------------------------------------------------------------

fn field<'a>(record: &'a StringRecord, idx: usize) -> Option<&'a str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn opt_field(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| field(record, i))
}

/// Parse a float, treating blanks, NaN and infinities as missing.
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Parse a start time. RFC 3339 first, then naive layouts read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_row(record: &StringRecord, cols: &Columns) -> Option<CandidateRow> {
    let tour_raw = field(record, cols.tour)?;
    let Some(tour) = Tour::parse(tour_raw) else {
        debug!(tour = tour_raw, "Unknown tour, row skipped");
        return None;
    };

    let model_prob = parse_number(opt_field(record, cols.model_prob));
    let blended_prob = parse_number(opt_field(record, cols.blended_prob));
    if model_prob.is_none() && blended_prob.is_none() {
        return None;
    }

    Some(CandidateRow {
        tour,
        player: field(record, cols.player)?.to_string(),
        opponent: field(record, cols.opponent)?.to_string(),
        best_odds: parse_number(field(record, cols.best_odds))?,
        best_odds_player: parse_number(opt_field(record, cols.best_odds_player)),
        best_odds_opponent: parse_number(opt_field(record, cols.best_odds_opponent)),
        market_prob: parse_number(opt_field(record, cols.market_prob)),
        model_prob,
        blended_prob,
        confidence: parse_number(field(record, cols.confidence))?,
        commence_time: parse_timestamp(field(record, cols.commence_time)?)?,
    })
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Read candidates from any CSV source. `source` names it in logs/errors.
pub fn read_candidates<R: Read>(reader: R, source: &str) -> Result<Loaded, ValueError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| ValueError::Csv {
            path: source.to_string(),
            source: e,
        })?
        .clone();

    let cols = match Columns::resolve(&headers) {
        Ok(cols) => cols,
        Err(missing) => {
            info!(source, missing = ?missing, "Candidate file lacks required columns");
            return Ok(Loaded::NoData(NoDataReason::MissingColumns(missing)));
        }
    };

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for (line, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(source, line = line + 2, error = %e, "Unreadable CSV record skipped");
                dropped += 1;
                continue;
            }
        };
        match parse_row(&record, &cols) {
            Some(row) => rows.push(row),
            None => {
                debug!(source, line = line + 2, "Row with missing or malformed values dropped");
                dropped += 1;
            }
        }
    }

    info!(source, rows = rows.len(), dropped, "Candidates loaded");
    Ok(Loaded::Rows { rows, dropped })
}

/// Read the candidate file at `path`. A missing file is not an error.
pub fn load_candidates(path: &Path) -> Result<Loaded, ValueError> {
    let shown = path.display().to_string();
    if !path.exists() {
        info!(path = %shown, "No candidate file, nothing to do");
        return Ok(Loaded::NoData(NoDataReason::MissingInput));
    }
    let file = File::open(path).map_err(|e| ValueError::Io {
        path: shown.clone(),
        source: e,
    })?;
    read_candidates(file, &shown)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
