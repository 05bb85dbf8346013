//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section has defaults, so an absent file or a partial one is fine.
//! The job-summary sink is referenced by env-var name and resolved at
//! runtime via `std::env::var`.

use anyhow::{Context, Result};
use chrono::TimeDelta;
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::types::{OddsBand, ValueError};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    /// Candidate CSV produced upstream.
    pub path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: "outputs/value_candidates.csv".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// Name of the env var holding the job-summary file path.
    pub summary_env: String,
    /// Optional standalone copy of the shortlist markdown.
    pub shortlist_path: Option<String>,
    /// Optional CSV of published picks for downstream notifiers.
    pub picks_csv: Option<String>,
    /// IANA time zone shown next to UTC kickoff times.
    pub local_tz: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            summary_env: "GITHUB_STEP_SUMMARY".to_string(),
            shortlist_path: None,
            picks_csv: None,
            local_tz: None,
        }
    }
}

impl OutputConfig {
    /// Parse `local_tz`, if set.
    pub fn timezone(&self) -> Result<Option<Tz>, ValueError> {
        match self.local_tz.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name
                .parse::<Tz>()
                .map(Some)
                .map_err(|_| ValueError::Config(format!("unknown time zone: {name}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter thresholds
// ---------------------------------------------------------------------------

/// Inclusion thresholds for the value-pick filter.
///
/// Immutable once loaded; passed by reference into the pipeline.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Only matches starting within this many hours are considered.
    pub lookahead_hours: i64,
    /// Minimum `p_sane - p_mkt`.
    pub min_edge: f64,
    /// Minimum expected value per unit stake.
    pub min_ev: f64,
    pub favorite_min_odds: f64,
    pub favorite_max_odds: f64,
    pub underdog_min_odds: f64,
    pub underdog_max_odds: f64,
    pub min_kelly_favorite: f64,
    pub min_kelly_underdog: f64,
    /// Picks kept per tour.
    pub max_underdogs: usize,
    pub max_favorites: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            lookahead_hours: 24,
            min_edge: 0.03,
            min_ev: 0.015,
            favorite_min_odds: 1.30,
            favorite_max_odds: 1.80,
            underdog_min_odds: 2.20,
            underdog_max_odds: 4.50,
            min_kelly_favorite: 0.02,
            min_kelly_underdog: 0.05,
            max_underdogs: 3,
            max_favorites: 2,
        }
    }
}

impl FilterConfig {
    /// Classify decimal odds into a band. Both ranges are inclusive.
    pub fn band_for(&self, odds: f64) -> OddsBand {
        if odds >= self.favorite_min_odds && odds <= self.favorite_max_odds {
            OddsBand::Favorite
        } else if odds >= self.underdog_min_odds && odds <= self.underdog_max_odds {
            OddsBand::Underdog
        } else {
            OddsBand::Excluded
        }
    }

    /// Kelly floor for a band. Excluded rows never qualify.
    pub fn min_kelly_for(&self, band: OddsBand) -> Option<f64> {
        match band {
            OddsBand::Favorite => Some(self.min_kelly_favorite),
            OddsBand::Underdog => Some(self.min_kelly_underdog),
            OddsBand::Excluded => None,
        }
    }

    /// Pick cap per tour for a band.
    pub fn max_picks_for(&self, band: OddsBand) -> usize {
        match band {
            OddsBand::Favorite => self.max_favorites,
            OddsBand::Underdog => self.max_underdogs,
            OddsBand::Excluded => 0,
        }
    }

    /// Lookahead window, or `None` if the hour count overflows a `TimeDelta`.
    pub fn lookahead(&self) -> Option<TimeDelta> {
        TimeDelta::try_hours(self.lookahead_hours)
    }

    /// Reject configurations that would make banding ambiguous.
    pub fn validate(&self) -> Result<(), ValueError> {
        let numbers = [
            self.min_edge,
            self.min_ev,
            self.favorite_min_odds,
            self.favorite_max_odds,
            self.underdog_min_odds,
            self.underdog_max_odds,
            self.min_kelly_favorite,
            self.min_kelly_underdog,
        ];
        if numbers.iter().any(|x| !x.is_finite()) {
            return Err(ValueError::Config("thresholds must be finite".into()));
        }
        if self.lookahead_hours <= 0 || self.lookahead().is_none() {
            return Err(ValueError::Config(format!(
                "lookahead_hours must be positive and representable, got {}",
                self.lookahead_hours
            )));
        }
        if self.favorite_min_odds <= 1.0 || self.favorite_min_odds > self.favorite_max_odds {
            return Err(ValueError::Config(format!(
                "favorite band [{}, {}] is invalid",
                self.favorite_min_odds, self.favorite_max_odds
            )));
        }
        if self.underdog_min_odds > self.underdog_max_odds {
            return Err(ValueError::Config(format!(
                "underdog band [{}, {}] is invalid",
                self.underdog_min_odds, self.underdog_max_odds
            )));
        }
        if self.underdog_min_odds <= self.favorite_max_odds {
            return Err(ValueError::Config(format!(
                "underdog band starts at {} but favorite band ends at {}",
                self.underdog_min_odds, self.favorite_max_odds
            )));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config
            .filter
            .validate()
            .with_context(|| format!("Invalid filter section in {path}"))?;
        config
            .output
            .timezone()
            .with_context(|| format!("Invalid output section in {path}"))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve an environment variable name to a non-empty value.
    pub fn resolve_env(env_name: &str) -> Result<String, ValueError> {
        match std::env::var(env_name) {
            Ok(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(ValueError::SummaryPathUnset(env_name.to_string())),
        }
    }
}
