//! Raw records as they come out of (and go into) a score store.
//!
//! Every field is optional: a document written by an older client or edited by
//! hand must still decode, and the leaderboard decides what to do with gaps.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Player document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Normalized phone number used as the stable identity.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name chosen at registration.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional team label, blank means no team.
    #[serde(default)]
    pub team: Option<String>,
    /// Registration timestamp.
    #[serde(default)]
    pub joined_at: Option<SystemTime>,
}

/// Score document for one `(player, stop)` pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Owner of the score.
    #[serde(default)]
    pub player_id: Option<String>,
    /// Stop the score was recorded for.
    #[serde(default)]
    pub stop_id: Option<String>,
    /// Sips taken at the stop.
    #[serde(default)]
    pub strokes: Option<u32>,
    /// Last time the score was written.
    #[serde(default)]
    pub recorded_at: Option<SystemTime>,
}

/// Every player and score document of one game, as read in a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotEntity {
    /// Player documents in registration order when the backend can provide it.
    pub players: Vec<PlayerEntity>,
    /// Score documents in no particular order.
    pub scores: Vec<ScoreEntity>,
}
