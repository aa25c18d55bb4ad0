use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::leaderboard::card::{CardStop, ScoreCard, par_diff_label};

/// Sips taken at a stop. Out-of-range values are clamped, not rejected.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitScoreRequest {
    /// Raw value; negatives are accepted and clamped.
    pub strokes: i64,
}

/// Outcome of a score submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreSubmittedResponse {
    /// Player who scored.
    pub player_id: String,
    /// Stop scored.
    pub stop_id: String,
    /// Value actually stored.
    pub strokes: u32,
    /// True when the submitted value was outside the allowed range.
    pub clamped: bool,
    /// Updated scorecard.
    pub card: ScoreCardDto,
}

/// Number of score entries removed by a reset.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResetResponse {
    /// Player whose card was cleared.
    pub player_id: String,
    /// Entries deleted.
    pub removed: usize,
}

/// One stop on the scorecard.
#[derive(Debug, Serialize, ToSchema)]
pub struct CardStopDto {
    /// Stop id.
    pub stop_id: String,
    /// Bar name.
    pub name: String,
    /// Par of the stop.
    pub par: u32,
    /// Recorded sips, `null` while unplayed.
    pub strokes: Option<u32>,
    /// `Eagle`, `Birdie`, `Par`... for played stops.
    pub result: Option<String>,
}

/// Personal scorecard with progress through the course.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreCardDto {
    /// Card owner.
    pub player_id: String,
    /// Owner name.
    pub display_name: String,
    /// Every stop in play order.
    pub stops: Vec<CardStopDto>,
    /// Same total as on the leaderboard.
    pub total: u32,
    /// Total minus the par of the played stops.
    pub par_diff: i64,
    /// Signed differential, `E` at even.
    pub par_diff_label: String,
    /// Current rank as displayed.
    pub rank_label: String,
    /// Players on the leaderboard.
    pub total_players: usize,
    /// First unplayed stop, `null` when finished.
    pub next_stop: Option<String>,
    /// Every stop has an entry.
    pub finished: bool,
}

impl From<CardStop> for CardStopDto {
    fn from(stop: CardStop) -> Self {
        Self {
            stop_id: stop.stop_id,
            name: stop.name,
            par: stop.par,
            strokes: stop.strokes,
            result: stop.result,
        }
    }
}

impl From<ScoreCard> for ScoreCardDto {
    fn from(card: ScoreCard) -> Self {
        Self {
            par_diff_label: par_diff_label(card.par_diff),
            player_id: card.player_id,
            display_name: card.display_name,
            stops: card.stops.into_iter().map(Into::into).collect(),
            total: card.total,
            par_diff: card.par_diff,
            rank_label: card.rank_label,
            total_players: card.total_players,
            next_stop: card.next_stop,
            finished: card.finished,
        }
    }
}
