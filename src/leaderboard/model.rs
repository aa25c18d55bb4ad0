use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
    time::SystemTime,
};

use thiserror::Error;
use tracing::warn;

use crate::dao::models::{PlayerEntity, ScoreEntity, SnapshotEntity};

/// Display name used when a player record carries no name.
pub const UNNAMED_PLAYER: &str = "Unnamed";

/// Identifier of a game instance, threaded explicitly through every store call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId(Arc<str>);

impl GameId {
    /// Wrap a raw identifier.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One fixed location of the crawl, with its par.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    /// Unique identifier referenced by score entries.
    pub id: String,
    /// Human readable venue name.
    pub name: String,
    /// Drink served at this stop.
    pub drink: String,
    /// Decorative emoji shown next to the drink.
    pub emoji: String,
    /// Target sip count for the stop.
    pub par: u32,
    /// Fixed global ordering of the stop.
    pub sequence_index: u32,
}

/// Reasons a stop list cannot be used for scoring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourseError {
    /// The stop list is empty.
    #[error("course has no stops")]
    Empty,
    /// Two stops share an id.
    #[error("duplicate stop id `{0}`")]
    DuplicateId(String),
    /// Two stops share a sequence index.
    #[error("duplicate sequence index {index} (stop `{stop_id}`)")]
    DuplicateSequence {
        /// Second stop using the index.
        stop_id: String,
        /// Index in conflict.
        index: u32,
    },
    /// A stop has a zero or negative par.
    #[error("stop `{0}` must have a par greater than zero")]
    InvalidPar(String),
}

/// Immutable, validated stop list sorted by `sequence_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    stops: Vec<Stop>,
}

impl Course {
    /// Validate and order the provided stops.
    pub fn new(mut stops: Vec<Stop>) -> Result<Self, CourseError> {
        if stops.is_empty() {
            return Err(CourseError::Empty);
        }

        let mut ids = HashSet::with_capacity(stops.len());
        let mut sequences = HashSet::with_capacity(stops.len());
        for stop in &stops {
            if stop.par == 0 {
                return Err(CourseError::InvalidPar(stop.id.clone()));
            }
            if !ids.insert(stop.id.as_str()) {
                return Err(CourseError::DuplicateId(stop.id.clone()));
            }
            if !sequences.insert(stop.sequence_index) {
                return Err(CourseError::DuplicateSequence {
                    stop_id: stop.id.clone(),
                    index: stop.sequence_index,
                });
            }
        }

        stops.sort_by_key(|stop| stop.sequence_index);
        Ok(Self { stops })
    }

    /// Stops in display order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Look up a stop by identifier.
    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.iter().find(|stop| stop.id == id)
    }

    /// Number of stops on the course.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Always false for a validated course; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

/// Score a player recorded for a single stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    /// Stop the score belongs to.
    pub stop_id: String,
    /// Sips taken; 0 when the stored value was missing or not a number.
    pub strokes: u32,
    /// Write time, when the store kept one.
    pub recorded_at: Option<SystemTime>,
}

/// Registered participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Stable identity (normalized phone number).
    pub id: String,
    /// Name shown on the board, "Unnamed" when blank.
    pub display_name: String,
    /// Trimmed team label, `None` when the player is unassigned.
    pub team: Option<String>,
    /// Registration time, used as the tie-break key.
    pub joined_at: Option<SystemTime>,
}

/// Point-in-time view of every player and their score entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Players in store order.
    pub players: Vec<Player>,
    /// Score entries keyed by player id.
    pub scores_by_player: HashMap<String, Vec<ScoreEntry>>,
}

impl GameSnapshot {
    /// Entries recorded by the given player, empty when none.
    pub fn entries(&self, player_id: &str) -> &[ScoreEntry] {
        self.scores_by_player
            .get(player_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Normalise an optional team label, mapping blank values to `None`.
pub fn normalize_team(team: Option<&str>) -> Option<String> {
    team.map(str::trim)
        .filter(|team| !team.is_empty())
        .map(str::to_string)
}

impl From<SnapshotEntity> for GameSnapshot {
    /// Convert raw store records, skipping the ones that cannot be attributed.
    fn from(entity: SnapshotEntity) -> Self {
        let mut seen = HashSet::new();
        let mut players = Vec::with_capacity(entity.players.len());
        for record in entity.players {
            match Player::try_from(record) {
                Ok(player) if seen.insert(player.id.clone()) => players.push(player),
                Ok(player) => warn!(player_id = %player.id, "duplicate player record skipped"),
                Err(reason) => warn!(reason, "malformed player record skipped"),
            }
        }

        let mut scores_by_player: HashMap<String, Vec<ScoreEntry>> = HashMap::new();
        for record in entity.scores {
            let (player_id, entry) = match score_from_entity(record) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    warn!(reason, "malformed score record skipped");
                    continue;
                }
            };

            let entries = scores_by_player.entry(player_id).or_default();
            match entries.iter_mut().find(|e| e.stop_id == entry.stop_id) {
                Some(existing) if entry.recorded_at >= existing.recorded_at => *existing = entry,
                Some(_) => {}
                None => entries.push(entry),
            }
        }

        Self {
            players,
            scores_by_player,
        }
    }
}

impl TryFrom<PlayerEntity> for Player {
    type Error = &'static str;

    fn try_from(value: PlayerEntity) -> Result<Self, Self::Error> {
        let id = value
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or("missing player id")?;
        let display_name = value
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNNAMED_PLAYER.to_string());

        Ok(Self {
            id,
            display_name,
            team: normalize_team(value.team.as_deref()),
            joined_at: value.joined_at,
        })
    }
}

fn score_from_entity(value: ScoreEntity) -> Result<(String, ScoreEntry), &'static str> {
    let player_id = value.player_id.ok_or("missing player id")?;
    let stop_id = value
        .stop_id
        .filter(|id| !id.is_empty())
        .ok_or("missing stop id")?;

    Ok((
        player_id,
        ScoreEntry {
            stop_id,
            strokes: value.strokes.unwrap_or(0),
            recorded_at: value.recorded_at,
        },
    ))
}
