//! Per-player totals, always re-derived from the full entry set.
//!
//! A stop counts once: when several entries exist for it, the latest one is
//! the value. Totals and par are computed from the same per-stop cells that
//! are displayed, so a row can never disagree with itself.

use indexmap::IndexMap;

use crate::leaderboard::model::{Course, ScoreEntry};

/// Strokes per stop in course order; `None` marks an unplayed stop.
pub type StopCells = IndexMap<String, Option<u32>>;

/// Totals derived for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    /// Sum of strokes over every played stop.
    pub total: u32,
    /// `total` minus the par of every played stop.
    pub par_diff: i64,
}

/// Latest entry per stop, in course order. Entries for stops not on the course are ignored.
///
/// "Latest" is the highest `recorded_at`; among equal timestamps the one
/// appearing last in `entries` wins.
pub fn per_stop(course: &Course, entries: &[ScoreEntry]) -> StopCells {
    course
        .stops()
        .iter()
        .map(|stop| {
            let strokes = entries
                .iter()
                .filter(|entry| entry.stop_id == stop.id)
                .max_by_key(|entry| entry.recorded_at)
                .map(|entry| entry.strokes);
            (stop.id.clone(), strokes)
        })
        .collect()
}

/// Sum the played cells of a player.
pub fn tally(course: &Course, cells: &StopCells) -> Tally {
    let mut total: u32 = 0;
    let mut par: u32 = 0;

    for stop in course.stops() {
        if let Some(Some(strokes)) = cells.get(&stop.id) {
            total = total.saturating_add(*strokes);
            par = par.saturating_add(stop.par);
        }
    }

    Tally {
        total,
        par_diff: i64::from(total) - i64::from(par),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::leaderboard::model::Stop;

    fn course() -> Course {
        let stop = |id: &str, par, sequence_index| Stop {
            id: id.into(),
            name: id.into(),
            drink: String::new(),
            emoji: String::new(),
            par,
            sequence_index,
        };
        Course::new(vec![stop("as", 3, 0), stop("pmans", 5, 1), stop("dogs", 2, 2)]).unwrap()
    }

    fn score(entries: &[ScoreEntry]) -> Tally {
        tally(&course(), &per_stop(&course(), entries))
    }

    fn entry(stop_id: &str, strokes: u32) -> ScoreEntry {
        ScoreEntry {
            stop_id: stop_id.into(),
            strokes,
            recorded_at: None,
        }
    }

    #[test]
    fn empty_card_totals_zero() {
        assert_eq!(score(&[]), Tally::default());
    }

    #[test]
    fn par_diff_only_counts_played_stops() {
        let entries = [entry("as", 4), entry("dogs", 1)];
        let result = score(&entries);
        assert_eq!(result.total, 5);
        // par 3 + par 2, pmans is unplayed
        assert_eq!(result.par_diff, 0);
    }

    #[test]
    fn zero_stroke_entry_is_played() {
        let result = score(&[entry("pmans", 0)]);
        assert_eq!(result.total, 0);
        assert_eq!(result.par_diff, -5);

        let cells = per_stop(&course(), &[entry("pmans", 0)]);
        assert_eq!(cells.get("pmans"), Some(&Some(0)));
        assert_eq!(cells.get("as"), Some(&None));
    }

    #[test]
    fn unknown_stops_are_ignored() {
        let result = score(&[entry("den", 9), entry("as", 2)]);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn per_stop_follows_course_order() {
        let entries = [entry("dogs", 1), entry("as", 4)];
        let cells = per_stop(&course(), &entries);
        let keys: Vec<_> = cells.keys().map(String::as_str).collect();
        assert_eq!(keys, ["as", "pmans", "dogs"]);
        assert_eq!(cells.values().copied().collect::<Vec<_>>(), [Some(4), None, Some(1)]);
    }

    #[test]
    fn repeated_stop_counts_only_its_latest_entry() {
        let earlier = ScoreEntry {
            recorded_at: Some(UNIX_EPOCH + Duration::from_secs(20)),
            ..entry("as", 5)
        };
        let later = ScoreEntry {
            recorded_at: Some(UNIX_EPOCH + Duration::from_secs(30)),
            ..entry("as", 2)
        };

        // order in the slice does not matter once timestamps are known
        let cells = per_stop(&course(), &[later.clone(), earlier.clone()]);
        assert_eq!(cells.get("as"), Some(&Some(2)));
        let result = tally(&course(), &cells);
        assert_eq!(result.total, 2);
        assert_eq!(result.par_diff, -1);

        // without timestamps the last entry wins
        let result = score(&[entry("as", 5), entry("as", 2)]);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn tally_is_idempotent() {
        let entries = [entry("as", 4), entry("pmans", 6)];
        assert_eq!(score(&entries), score(&entries));
    }
}
