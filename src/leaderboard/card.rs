//! Personal scorecard projection of a leaderboard row.

use crate::leaderboard::{Leaderboard, model::Course};

/// One stop on a player's card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardStop {
    /// Stop id.
    pub stop_id: String,
    /// Display name of the stop.
    pub name: String,
    /// Par of the stop.
    pub par: u32,
    /// Recorded sips, `None` while unplayed.
    pub strokes: Option<u32>,
    /// Golf-style result for played stops.
    pub result: Option<String>,
}

/// Progress and standing of a single player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    /// Card owner.
    pub player_id: String,
    /// Owner's display name.
    pub display_name: String,
    /// Every stop in course order.
    pub stops: Vec<CardStop>,
    /// Same total as on the leaderboard.
    pub total: u32,
    /// Difference to the par of the played stops.
    pub par_diff: i64,
    /// Rank label as shown on the leaderboard.
    pub rank_label: String,
    /// Number of ranked players.
    pub total_players: usize,
    /// First stop in course order without an entry.
    pub next_stop: Option<String>,
    /// Every stop has an entry.
    pub finished: bool,
}

impl ScoreCard {
    /// Project the card of `player_id`, `None` if the player is not on the board.
    pub fn from_board(course: &Course, board: &Leaderboard, player_id: &str) -> Option<Self> {
        let row = board.player(player_id)?;

        let stops: Vec<CardStop> = course
            .stops()
            .iter()
            .map(|stop| {
                let strokes = row.per_stop.get(&stop.id).copied().flatten();
                CardStop {
                    stop_id: stop.id.clone(),
                    name: stop.name.clone(),
                    par: stop.par,
                    strokes,
                    result: strokes.map(|strokes| result_label(strokes, stop.par)),
                }
            })
            .collect();

        let next_stop = stops
            .iter()
            .find(|stop| stop.strokes.is_none())
            .map(|stop| stop.stop_id.clone());

        Some(Self {
            player_id: row.player_id.clone(),
            display_name: row.display_name.clone(),
            finished: next_stop.is_none(),
            next_stop,
            stops,
            total: row.total,
            par_diff: row.par_diff,
            rank_label: row.placing.rank_label.clone(),
            total_players: board.players.len(),
        })
    }
}

/// Golf name for a stop result relative to par.
pub fn result_label(strokes: u32, par: u32) -> String {
    let diff = i64::from(strokes) - i64::from(par);
    match diff {
        d if d < -2 => d.to_string(),
        -2 => "Eagle".into(),
        -1 => "Birdie".into(),
        0 => "Par".into(),
        1 => "Bogey".into(),
        2 => "Double Bogey".into(),
        d => format!("+{d}"),
    }
}

/// Signed par differential label, `+0` when level.
pub fn par_diff_label(par_diff: i64) -> String {
    if par_diff < 0 {
        par_diff.to_string()
    } else {
        format!("+{par_diff}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::{
        compute_leaderboard,
        model::{GameSnapshot, Player, ScoreEntry, Stop},
    };

    #[test]
    fn result_labels() {
        assert_eq!(result_label(1, 5), "-4");
        assert_eq!(result_label(1, 3), "Eagle");
        assert_eq!(result_label(2, 3), "Birdie");
        assert_eq!(result_label(3, 3), "Par");
        assert_eq!(result_label(4, 3), "Bogey");
        assert_eq!(result_label(5, 3), "Double Bogey");
        assert_eq!(result_label(9, 3), "+6");
    }

    #[test]
    fn par_diff_labels() {
        assert_eq!(par_diff_label(0), "+0");
        assert_eq!(par_diff_label(3), "+3");
        assert_eq!(par_diff_label(-2), "-2");
    }

    #[test]
    fn card_tracks_progress() {
        let course = Course::new(vec![
            Stop {
                id: "as".into(),
                name: "A's".into(),
                drink: String::new(),
                emoji: String::new(),
                par: 3,
                sequence_index: 0,
            },
            Stop {
                id: "dogs".into(),
                name: "Doggies".into(),
                drink: String::new(),
                emoji: String::new(),
                par: 2,
                sequence_index: 1,
            },
        ])
        .unwrap();
        let mut snapshot = GameSnapshot::default();
        snapshot.players.push(Player {
            id: "p".into(),
            display_name: "Pat".into(),
            team: None,
            joined_at: None,
        });
        snapshot.scores_by_player.insert(
            "p".into(),
            vec![ScoreEntry {
                stop_id: "as".into(),
                strokes: 4,
                recorded_at: None,
            }],
        );

        let board = compute_leaderboard(&course, &snapshot);
        let card = ScoreCard::from_board(&course, &board, "p").unwrap();
        assert_eq!(card.next_stop.as_deref(), Some("dogs"));
        assert!(!card.finished);
        assert_eq!(card.par_diff, 1);
        assert_eq!(card.rank_label, "1");
        assert_eq!(card.total_players, 1);
        assert_eq!(card.stops[0].result.as_deref(), Some("Bogey"));
        assert_eq!(card.stops[1].result, None);

        assert!(ScoreCard::from_board(&course, &board, "missing").is_none());
    }
}
