//! Run orchestration: load → select → render → publish.
//!
//! "Nothing to report" comes back as `RunOutcome::NoData`; only genuine
//! failures are errors.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{AppConfig, OutputConfig};
use crate::data::candidates::{load_candidates, Loaded};
use crate::report::render_markdown;
use crate::report::sink::{append_summary, write_picks_csv, write_shortlist};
use crate::strategy::{select_picks, Shortlist};
use crate::types::{NoDataReason, RunOutcome, ValueError};

/// Where the rendered markdown goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryTarget {
    /// Print to stdout instead of appending to a file.
    Stdout,
    /// File path taken from this environment variable at publish time.
    Env(String),
    /// Explicit file path.
    File(PathBuf),
}

impl SummaryTarget {
    fn resolve(&self) -> Result<Option<PathBuf>, ValueError> {
        match self {
            SummaryTarget::Stdout => Ok(None),
            SummaryTarget::Env(name) => {
                AppConfig::resolve_env(name).map(|p| Some(PathBuf::from(p)))
            }
            SummaryTarget::File(path) => Ok(Some(path.clone())),
        }
    }
}

/// Per-invocation inputs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub now: DateTime<Utc>,
    pub target: SummaryTarget,
}

/// Execute one pass over the candidate file.
pub fn run(config: &AppConfig, opts: &RunOptions) -> Result<RunOutcome, ValueError> {
    info!(input = %opts.input.display(), now = %opts.now, "Starting value-pick run");

    let rows = match load_candidates(&opts.input)? {
        Loaded::Rows { rows, .. } => rows,
        Loaded::NoData(reason) => return Ok(RunOutcome::NoData(reason)),
    };

    let shortlist = select_picks(&rows, &config.filter, opts.now);
    if shortlist.stats.in_window == 0 {
        return Ok(RunOutcome::NoData(NoDataReason::NoRowsInWindow));
    }

    let local_tz = config.output.timezone()?;
    let Some(markdown) = render_markdown(&shortlist, opts.now, local_tz) else {
        return Ok(RunOutcome::NoData(NoDataReason::NoQualifyingPicks));
    };

    publish(&markdown, &shortlist, &config.output, &opts.target)?;
    Ok(RunOutcome::Published {
        picks: shortlist.pick_count(),
    })
}

/// Write every configured output. The summary destination is resolved
/// first so a misconfigured run writes nothing.
fn publish(
    markdown: &str,
    shortlist: &Shortlist,
    output: &OutputConfig,
    target: &SummaryTarget,
) -> Result<(), ValueError> {
    let summary_path = target.resolve()?;

    if let Some(path) = &output.shortlist_path {
        write_shortlist(Path::new(path), markdown)?;
    }
    if let Some(path) = &output.picks_csv {
        write_picks_csv(Path::new(path), shortlist.picks())?;
    }

    match summary_path {
        Some(path) => append_summary(&path, markdown)?,
        None => print!("{markdown}"),
    }

    if shortlist.stats.qualified > shortlist.stats.published {
        debug!(
            qualified = shortlist.stats.qualified,
            published = shortlist.stats.published,
            "Some qualifying picks were cut by dedup or per-tour caps"
        );
    }
    Ok(())
}
