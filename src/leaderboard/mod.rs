//! Live leaderboard core: aggregation, ranking and team roll-up.
//!
//! Every call re-derives the full ranked view from a snapshot. Nothing here
//! keeps state between calls, so the same snapshot always yields the same
//! leaderboard.

/// Per-stop cells and totals.
pub mod aggregate;
/// Personal scorecard.
pub mod card;
/// Domain types built from stored records.
pub mod model;
/// Ordering, placeholder ranks and medals.
pub mod rank;
/// Team roll-up.
pub mod teams;

use std::cmp::Ordering;

use self::{
    aggregate::{StopCells, per_stop, tally},
    model::{Course, GameSnapshot, Player},
    rank::{Placing, rank_by},
    teams::{TeamKey, roll_up},
};

/// Ranked individual standing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedRow {
    /// Player id, the phone number for self-registered players.
    pub player_id: String,
    /// Name shown on the board.
    pub display_name: String,
    /// Team label, `None` for players without one.
    pub team: Option<String>,
    /// Position, rank and medal.
    pub placing: Placing,
    /// Strokes per stop in course order, `None` when unplayed.
    pub per_stop: StopCells,
    /// Sum of the played cells.
    pub total: u32,
    /// `total` minus the par of the played stops.
    pub par_diff: i64,
}

/// Ranked team standing. Team rows are sum-only, members carry the per-stop detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTeamRow {
    /// Team label or the unassigned bucket.
    pub team: TeamKey,
    /// Position, rank and medal among teams.
    pub placing: Placing,
    /// Sum of the member totals.
    pub total: u32,
    /// Member rows in their overall individual order.
    pub members: Vec<RankedRow>,
}

/// Complete ranked view derived from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    /// Individual standings, best first.
    pub players: Vec<RankedRow>,
    /// Team standings, best first.
    pub teams: Vec<RankedTeamRow>,
}

impl Leaderboard {
    /// Find the row of a given player.
    pub fn player(&self, player_id: &str) -> Option<&RankedRow> {
        self.players.iter().find(|row| row.player_id == player_id)
    }
}

/// Rank every player of the snapshot, then roll the rows up into teams.
pub fn compute_leaderboard(course: &Course, snapshot: &GameSnapshot) -> Leaderboard {
    let tallied: Vec<_> = snapshot
        .players
        .iter()
        .map(|player| {
            let cells = per_stop(course, snapshot.entries(&player.id));
            (player, tally(course, &cells), cells)
        })
        .collect();

    let players: Vec<RankedRow> = rank_by(
        tallied,
        |(_, tally, _)| tally.total,
        |a, b| registration_order(a.0, b.0),
    )
    .into_iter()
    .map(|(placing, (player, tally, per_stop))| RankedRow {
        player_id: player.id.clone(),
        display_name: player.display_name.clone(),
        team: player.team.clone(),
        placing,
        per_stop,
        total: tally.total,
        par_diff: tally.par_diff,
    })
    .collect();

    let teams = roll_up(&players);
    Leaderboard { players, teams }
}

/// Earliest registration first, unknown registration time last, then by id.
fn registration_order(a: &Player, b: &Player) -> Ordering {
    let by_join = match (a.joined_at, b.joined_at) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_join.then_with(|| a.id.cmp(&b.id))
}
