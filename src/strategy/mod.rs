//! Strategy pipeline: time window, per-row evaluation, dedup and ranking.
//!
//! Everything here is a pure function of the rows, the filter config and
//! the `now` instant handed in by the caller.

pub mod edge;
pub mod kelly;
pub mod vig;

use chrono::{DateTime, Duration, TimeDelta, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::FilterConfig;
use crate::types::{CandidateRow, OddsBand, Pick, Tour};
use edge::evaluate;

// ---------------------------------------------------------------------------
// Shortlist
// ---------------------------------------------------------------------------

/// Picks for one (tour, band) combination, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub tour: Tour,
    pub band: OddsBand,
    pub picks: Vec<Pick>,
}

/// Counters from one pass, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    pub rows_in: usize,
    pub in_window: usize,
    pub qualified: usize,
    pub after_dedup: usize,
    pub published: usize,
}

/// Final shortlist. Empty sections are never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shortlist {
    pub sections: Vec<Section>,
    pub stats: SelectionStats,
}

impl Shortlist {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn pick_count(&self) -> usize {
        self.sections.iter().map(|s| s.picks.len()).sum()
    }

    pub fn picks(&self) -> impl Iterator<Item = &Pick> {
        self.sections.iter().flat_map(|s| s.picks.iter())
    }
}

// ---------------------------------------------------------------------------
// Pipeline steps
// ---------------------------------------------------------------------------

/// Whether a match starts within `[now, now + lookahead]`.
pub fn within_window(start: DateTime<Utc>, now: DateTime<Utc>, lookahead: Duration) -> bool {
    let until = start - now;
    until >= Duration::zero() && until <= lookahead
}

/// Descending order on `(p_sane, kelly)`, then names for a stable result.
fn by_rank(a: &Pick, b: &Pick) -> Ordering {
    let (pa, ka) = a.rank_key();
    let (pb, kb) = b.rank_key();
    pb.total_cmp(&pa)
        .then_with(|| kb.total_cmp(&ka))
        .then_with(|| a.player.cmp(&b.player))
        .then_with(|| a.opponent.cmp(&b.opponent))
}

/// Collapse picks describing the same match from either side.
///
/// The survivor has the greatest `(p_sane, kelly)`; on an exact tie the
/// first one seen is kept.
pub fn dedup(picks: Vec<Pick>) -> Vec<Pick> {
    let mut best: HashMap<(String, String), Pick> = HashMap::new();

    for pick in picks {
        let key = pick.match_key();
        let replace = best.get(&key).map_or(true, |current| beats(&pick, current));
        if replace {
            best.insert(key, pick);
        } else {
            debug!(player = %pick.player, opponent = %pick.opponent, "Duplicate match dropped");
        }
    }

    let mut out: Vec<Pick> = best.into_values().collect();
    out.sort_by(by_rank);
    out
}

fn beats(a: &Pick, b: &Pick) -> bool {
    let (pa, ka) = a.rank_key();
    let (pb, kb) = b.rank_key();
    pa.total_cmp(&pb).then_with(|| ka.total_cmp(&kb)) == Ordering::Greater
}

/// Group by tour and band, rank, and cap each group.
pub fn rank_and_truncate(picks: &[Pick], config: &FilterConfig) -> Vec<Section> {
    let mut sections = Vec::new();
    for tour in Tour::ALL {
        for band in [OddsBand::Underdog, OddsBand::Favorite] {
            let mut group: Vec<Pick> = picks
                .iter()
                .filter(|p| p.tour == tour && p.band == band)
                .cloned()
                .collect();
            group.sort_by(by_rank);
            group.truncate(config.max_picks_for(band));
            if !group.is_empty() {
                sections.push(Section { tour, band, picks: group });
            }
        }
    }
    sections
}

/// Run the full filter over a batch of candidate rows.
pub fn select_picks(rows: &[CandidateRow], config: &FilterConfig, now: DateTime<Utc>) -> Shortlist {
    let lookahead = config.lookahead().unwrap_or(TimeDelta::MAX);
    let mut stats = SelectionStats {
        rows_in: rows.len(),
        ..Default::default()
    };

    let windowed: Vec<&CandidateRow> = rows
        .iter()
        .filter(|r| within_window(r.commence_time, now, lookahead))
        .collect();
    stats.in_window = windowed.len();

    let qualified: Vec<Pick> = windowed.into_iter().filter_map(|r| evaluate(r, config)).collect();
    stats.qualified = qualified.len();

    let unique = dedup(qualified);
    stats.after_dedup = unique.len();

    let sections = rank_and_truncate(&unique, config);
    stats.published = sections.iter().map(|s| s.picks.len()).sum();

    info!(
        rows = stats.rows_in,
        in_window = stats.in_window,
        qualified = stats.qualified,
        unique = stats.after_dedup,
        published = stats.published,
        "Selection complete"
    );

    Shortlist { sections, stats }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn row(tour: Tour, player: &str, opponent: &str, odds: f64, p: f64) -> CandidateRow {
        let mut r = CandidateRow::sample(player, opponent, odds);
        r.tour = tour;
        r.model_prob = Some(p);
        r.confidence = 100.0;
        r.commence_time = now() + Duration::hours(4);
        r
    }

    fn pick(player: &str, opponent: &str, p_sane: f64, kelly: f64) -> Pick {
        Pick {
            tour: Tour::Atp,
            band: OddsBand::Underdog,
            player: player.into(),
            opponent: opponent.into(),
            odds: 2.5,
            p_market: 0.4,
            p_sane,
            edge: p_sane - 0.4,
            ev: 2.5 * p_sane - 1.0,
            kelly,
            commence_time: now(),
        }
    }

    #[test]
    fn test_within_window() {
        let n = now();
        let day = Duration::hours(24);
        assert!(within_window(n, n, day));
        assert!(within_window(n + Duration::hours(24), n, day));
        assert!(!within_window(n + Duration::hours(24) + Duration::seconds(1), n, day));
        assert!(!within_window(n - Duration::minutes(1), n, day));
    }

    #[test]
    fn test_dedup_keeps_higher_probability() {
        let a = pick("Sinner", "Alcaraz", 0.48, 0.10);
        let b = pick("Alcaraz", "Sinner", 0.55, 0.06);
        let out = dedup(vec![a, b.clone()]);
        assert_eq!(out, vec![b]);
    }

    #[test]
    fn test_dedup_ties_broken_by_kelly() {
        let a = pick("Sinner", "Alcaraz", 0.50, 0.10);
        let b = pick("Alcaraz", "Sinner", 0.50, 0.20);
        let out = dedup(vec![a, b.clone()]);
        assert_eq!(out, vec![b]);
    }

    #[test]
    fn test_dedup_symmetric_under_label_swap() {
        let a = pick("Sinner", "Alcaraz", 0.48, 0.10);
        let b = pick("Alcaraz", "Sinner", 0.55, 0.06);
        let forward = dedup(vec![a.clone(), b.clone()]);

        let mut a2 = a.clone();
        std::mem::swap(&mut a2.player, &mut a2.opponent);
        let mut b2 = b.clone();
        std::mem::swap(&mut b2.player, &mut b2.opponent);
        let swapped = dedup(vec![a2, b2]);

        assert_eq!(forward.len(), 1);
        assert_eq!(swapped.len(), 1);
        assert_eq!(forward[0].p_sane, swapped[0].p_sane);
        assert_eq!(forward[0].kelly, swapped[0].kelly);

        // Input order does not matter either.
        assert_eq!(dedup(vec![b, a]), forward);
    }

    #[test]
    fn test_dedup_keeps_distinct_matches() {
        let out = dedup(vec![
            pick("A", "B", 0.5, 0.1),
            pick("C", "D", 0.6, 0.1),
            pick("B", "C", 0.4, 0.1),
        ]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].player, "C");
    }

    #[test]
    fn test_top_three_underdogs_per_tour() {
        let cfg = FilterConfig::default();
        let rows: Vec<CandidateRow> = (0..5)
            .map(|i| {
                let p = 0.40 + 0.01 * i as f64;
                row(Tour::Atp, &format!("Dog{i}"), &format!("Fav{i}"), 3.0, p)
            })
            .collect();

        let shortlist = select_picks(&rows, &cfg, now());
        assert_eq!(shortlist.stats.qualified, 5);
        assert_eq!(shortlist.sections.len(), 1);
        let section = &shortlist.sections[0];
        assert_eq!(section.tour, Tour::Atp);
        assert_eq!(section.band, OddsBand::Underdog);
        let names: Vec<&str> = section.picks.iter().map(|p| p.player.as_str()).collect();
        assert_eq!(names, vec!["Dog4", "Dog3", "Dog2"]);
    }

    #[test]
    fn test_favorites_capped_at_two() {
        let cfg = FilterConfig::default();
        let rows: Vec<CandidateRow> = (0..4)
            .map(|i| {
                let p = 0.70 + 0.01 * i as f64;
                row(Tour::Wta, &format!("F{i}"), &format!("U{i}"), 1.60, p)
            })
            .collect();
        let shortlist = select_picks(&rows, &cfg, now());
        assert_eq!(shortlist.pick_count(), 2);
        assert_eq!(shortlist.sections[0].tour, Tour::Wta);
        assert_eq!(shortlist.sections[0].band, OddsBand::Favorite);
        assert_eq!(shortlist.sections[0].picks[0].player, "F3");
    }

    #[test]
    fn test_section_order_and_empty_sections_omitted() {
        let cfg = FilterConfig::default();
        let rows = vec![
            row(Tour::Wta, "W1", "W2", 3.0, 0.45),
            row(Tour::Atp, "A1", "A2", 1.60, 0.72),
            row(Tour::Atp, "A3", "A4", 3.0, 0.45),
        ];
        let shortlist = select_picks(&rows, &cfg, now());
        let order: Vec<(Tour, OddsBand)> =
            shortlist.sections.iter().map(|s| (s.tour, s.band)).collect();
        assert_eq!(
            order,
            vec![
                (Tour::Atp, OddsBand::Underdog),
                (Tour::Atp, OddsBand::Favorite),
                (Tour::Wta, OddsBand::Underdog),
            ]
        );
    }

    #[test]
    fn test_opposite_perspective_rows_collapse() {
        let cfg = FilterConfig::default();
        // Both sides look like value because each model row is confident.
        let rows = vec![
            row(Tour::Atp, "Ruud", "Fritz", 2.50, 0.46),
            row(Tour::Atp, "Fritz", "Ruud", 1.70, 0.66),
        ];
        let shortlist = select_picks(&rows, &cfg, now());
        assert_eq!(shortlist.stats.qualified, 2);
        assert_eq!(shortlist.stats.after_dedup, 1);
        let survivor = shortlist.picks().next().unwrap();
        assert_eq!(survivor.player, "Fritz");
    }

    #[test]
    fn test_rows_outside_window_ignored() {
        let cfg = FilterConfig::default();
        let mut late = row(Tour::Atp, "A", "B", 3.0, 0.45);
        late.commence_time = now() + Duration::hours(30);
        let mut started = row(Tour::Atp, "C", "D", 3.0, 0.45);
        started.commence_time = now() - Duration::hours(1);

        let shortlist = select_picks(&[late, started], &cfg, now());
        assert!(shortlist.is_empty());
        assert_eq!(shortlist.stats.rows_in, 2);
        assert_eq!(shortlist.stats.in_window, 0);
    }

    #[test]
    fn test_oversized_lookahead_does_not_panic() {
        let cfg = FilterConfig {
            lookahead_hours: 3_000_000_000_000_000,
            ..Default::default()
        };
        let mut far = row(Tour::Atp, "A", "B", 3.0, 0.45);
        far.commence_time = now() + Duration::days(3650);

        assert!(select_picks(&[], &cfg, now()).is_empty());
        let shortlist = select_picks(&[far], &cfg, now());
        assert_eq!(shortlist.stats.in_window, 1);
    }

    #[test]
    fn test_custom_caps() {
        let cfg = FilterConfig {
            max_underdogs: 1,
            ..Default::default()
        };
        let rows = vec![
            row(Tour::Atp, "A", "B", 3.0, 0.45),
            row(Tour::Atp, "C", "D", 3.0, 0.47),
        ];
        let shortlist = select_picks(&rows, &cfg, now());
        assert_eq!(shortlist.pick_count(), 1);
        assert_eq!(shortlist.sections[0].picks[0].player, "C");
    }
}
