//! Leaderboard projections served over REST and SSE.

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::format_system_time,
    leaderboard::{RankedRow, RankedTeamRow, card::par_diff_label, model::Course},
    state::PublishedBoard,
};

/// Cell shown for a stop a player has not played yet.
pub const UNPLAYED_CELL: &str = "-";

/// Column header of the per-stop grid.
#[derive(Debug, Serialize, ToSchema)]
pub struct StopColumn {
    /// Stop id.
    pub id: String,
    /// Column title.
    pub name: String,
    /// Par of the stop.
    pub par: u32,
}

/// Individual standing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerRowDto {
    /// Player id.
    pub player_id: String,
    /// Name shown on the board.
    pub display_name: String,
    /// Team label, `null` without a team.
    pub team: Option<String>,
    /// Zero-based slot in the ordering.
    pub position: usize,
    /// One-based rank, `null` while the player has no score.
    pub rank: Option<usize>,
    /// Rank as displayed, `-` while unranked.
    pub rank_label: String,
    /// Medal emoji for the top three, empty otherwise.
    pub medal: String,
    /// Display cells in stop order, `-` for unplayed stops.
    pub cells: Vec<String>,
    /// Raw strokes keyed by stop id, `null` for unplayed stops.
    #[schema(value_type = Object)]
    pub per_stop: IndexMap<String, Option<u32>>,
    /// Sum of the played cells.
    pub total: u32,
    /// Total minus the par of the played stops.
    pub par_diff: i64,
    /// Signed differential, `E` at even.
    pub par_diff_label: String,
}

impl From<&RankedRow> for PlayerRowDto {
    fn from(row: &RankedRow) -> Self {
        Self {
            player_id: row.player_id.clone(),
            display_name: row.display_name.clone(),
            team: row.team.clone(),
            position: row.placing.position,
            rank: row.placing.rank,
            rank_label: row.placing.rank_label.clone(),
            medal: row.placing.medal.clone(),
            cells: row
                .per_stop
                .values()
                .map(|strokes| strokes.map_or_else(|| UNPLAYED_CELL.to_string(), |s| s.to_string()))
                .collect(),
            per_stop: row.per_stop.clone(),
            total: row.total,
            par_diff: row.par_diff,
            par_diff_label: par_diff_label(row.par_diff),
        }
    }
}

/// Team standing. Header cells are blank; members carry the per-stop detail.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamRowDto {
    /// Team label, or the unassigned bucket label.
    pub team: String,
    /// False for the bucket of players without a team.
    pub named: bool,
    /// Zero-based slot among teams.
    pub position: usize,
    /// One-based rank, `null` while the team has no score.
    pub rank: Option<usize>,
    /// Rank as displayed.
    pub rank_label: String,
    /// Medal emoji for the top three teams.
    pub medal: String,
    /// Blank cells, one per stop.
    pub cells: Vec<String>,
    /// Sum of the member totals.
    pub total: u32,
    /// Members in their overall order.
    pub members: Vec<PlayerRowDto>,
}

impl TeamRowDto {
    fn from_row(row: &RankedTeamRow, columns: usize) -> Self {
        Self {
            team: row.team.label().to_string(),
            named: row.team.name().is_some(),
            position: row.placing.position,
            rank: row.placing.rank,
            rank_label: row.placing.rank_label.clone(),
            medal: row.placing.medal.clone(),
            cells: vec![String::new(); columns],
            total: row.total,
            members: row.members.iter().map(PlayerRowDto::from).collect(),
        }
    }
}

/// Full leaderboard snapshot as currently published.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Game being ranked.
    pub game_id: String,
    /// Refresh generation that produced this view.
    pub generation: u64,
    /// `manual`, `score_submitted` or `store_notification`.
    pub trigger: Option<String>,
    /// RFC 3339 time of the last successful computation.
    pub computed_at: Option<String>,
    /// Present while the data feed is failing; rows are then the last good ones.
    pub warning: Option<String>,
    /// Grid columns in play order.
    pub stops: Vec<StopColumn>,
    /// Individual standings.
    pub players: Vec<PlayerRowDto>,
    /// Team standings.
    pub teams: Vec<TeamRowDto>,
}

impl LeaderboardResponse {
    /// Project a published board onto the wire format.
    pub fn new(game_id: &str, course: &Course, published: &PublishedBoard) -> Self {
        let stops: Vec<StopColumn> = course
            .stops()
            .iter()
            .map(|stop| StopColumn {
                id: stop.id.clone(),
                name: stop.name.clone(),
                par: stop.par,
            })
            .collect();
        let columns = stops.len();

        Self {
            game_id: game_id.to_string(),
            generation: published.generation,
            trigger: published.trigger.map(|trigger| trigger.as_str().to_string()),
            computed_at: published.computed_at.map(format_system_time),
            warning: published.warning.clone(),
            stops,
            players: published.board.players.iter().map(PlayerRowDto::from).collect(),
            teams: published
                .board
                .teams
                .iter()
                .map(|row| TeamRowDto::from_row(row, columns))
                .collect(),
        }
    }
}
