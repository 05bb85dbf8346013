//! Markdown shortlist rendering.
//!
//! One section per (tour, band) with picks; sections without picks are
//! left out entirely.

pub mod sink;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt::Write;

use crate::strategy::{Section, Shortlist};
use crate::types::Pick;

/// Timestamp layout used throughout the report.
pub const UTC_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Local-time suffix, e.g. `16:05 CEST`.
const LOCAL_FORMAT: &str = "%H:%M %Z";

pub fn format_utc(ts: DateTime<Utc>) -> String {
    ts.format(UTC_FORMAT).to_string()
}

/// UTC timestamp, followed by the local wall-clock time when a zone is set.
pub fn format_time(ts: DateTime<Utc>, local_tz: Option<Tz>) -> String {
    match local_tz {
        Some(tz) => format!(
            "{} ({})",
            format_utc(ts),
            ts.with_timezone(&tz).format(LOCAL_FORMAT)
        ),
        None => format_utc(ts),
    }
}

/// One numbered shortlist line.
pub fn pick_line(rank: usize, pick: &Pick, local_tz: Option<Tz>) -> String {
    format!(
        "{rank}. {} vs {} | odds {:.2} | p={:.3} | Kelly={:.3} | EV={:+.3} | {}",
        pick.player,
        pick.opponent,
        pick.odds,
        pick.p_sane,
        pick.kelly,
        pick.ev,
        format_time(pick.commence_time, local_tz),
    )
}

fn render_section(out: &mut String, section: &Section, local_tz: Option<Tz>) {
    let _ = writeln!(out, "### {} {}", section.tour, section.band);
    for (i, pick) in section.picks.iter().enumerate() {
        let _ = writeln!(out, "{}", pick_line(i + 1, pick, local_tz));
    }
    out.push('\n');
}

/// Render the shortlist, or `None` when there is nothing to show.
pub fn render_markdown(
    shortlist: &Shortlist,
    now: DateTime<Utc>,
    local_tz: Option<Tz>,
) -> Option<String> {
    if shortlist.is_empty() {
        return None;
    }

    let mut out = String::new();
    out.push_str("## Tennis value picks\n\n");
    let _ = writeln!(out, "Updated: {}\n", format_time(now, local_tz));
    for section in &shortlist.sections {
        render_section(&mut out, section, local_tz);
    }
    Some(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
