//! Output sinks: CI job summary, shortlist file, picks CSV.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::types::{Pick, ValueError};

fn io_err(path: &Path, source: std::io::Error) -> ValueError {
    ValueError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn ensure_parent(path: &Path) -> Result<(), ValueError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    Ok(())
}

/// Append markdown to the job-summary file, creating it if needed.
pub fn append_summary(path: &Path, markdown: &str) -> Result<(), ValueError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    file.write_all(markdown.as_bytes()).map_err(|e| io_err(path, e))?;
    info!(path = %path.display(), bytes = markdown.len(), "Job summary appended");
    Ok(())
}

/// Write (overwrite) a standalone copy of the shortlist.
pub fn write_shortlist(path: &Path, markdown: &str) -> Result<(), ValueError> {
    ensure_parent(path)?;
    fs::write(path, markdown).map_err(|e| io_err(path, e))?;
    debug!(path = %path.display(), "Shortlist written");
    Ok(())
}

/// Write published picks as CSV for downstream notifiers.
pub fn write_picks_csv<'a, I>(path: &Path, picks: I) -> Result<usize, ValueError>
where
    I: IntoIterator<Item = &'a Pick>,
{
    ensure_parent(path)?;
    let csv_err = |source: csv::Error| ValueError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    let mut count = 0usize;
    for pick in picks {
        wtr.serialize(pick).map_err(csv_err)?;
        count += 1;
    }
    wtr.flush().map_err(|e| io_err(path, e))?;
    debug!(path = %path.display(), picks = count, "Picks CSV written");
    Ok(count)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OddsBand, Tour};
    use chrono::{DateTime, Utc};
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("tennis_value_test_{}_{name}", uuid::Uuid::new_v4()));
        p
    }

    fn sample_pick() -> Pick {
        Pick {
            tour: Tour::Wta,
            band: OddsBand::Favorite,
            player: "Swiatek".into(),
            opponent: "Gauff".into(),
            odds: 1.6,
            p_market: 0.625,
            p_sane: 0.7,
            edge: 0.075,
            ev: 0.12,
            kelly: 1.0,
            commence_time: DateTime::parse_from_rfc3339("2026-10-19T18:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_append_summary_appends() {
        let path = temp_path("summary.md");
        let _ = fs::remove_file(&path);

        fs::write(&path, "existing\n").unwrap();
        append_summary(&path, "first\n").unwrap();
        append_summary(&path, "second\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nfirst\nsecond\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_shortlist_creates_parent_dirs() {
        let dir = temp_path("shortlist_dir");
        let path = dir.join("nested").join("shortlist.md");
        write_shortlist(&path, "# hi\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# hi\n");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_picks_csv() {
        let path = temp_path("picks.csv");
        let picks = vec![sample_pick()];
        assert_eq!(write_picks_csv(&path, &picks).unwrap(), 1);

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "tour,band,player,opponent,odds,p_market,p_sane,edge,ev,kelly,commence_time_utc"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("WTA,favorite,Swiatek,Gauff,1.6,"));
        assert!(row.ends_with("2026-10-19T18:30:00Z"));

        fs::remove_file(&path).unwrap();
    }
}
