/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
mod subscription;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{
    dao::{
        models::{PlayerEntity, ScoreEntity, SnapshotEntity},
        storage::{StorageError, StorageResult},
    },
    leaderboard::model::GameId,
};

pub use self::subscription::Subscription;

/// Notification pushed by a store subscription.
///
/// The feed never carries data. A listener reacting to [`FeedEvent::Changed`]
/// reads a fresh snapshot itself, so it can order that read against its own
/// refreshes.
#[derive(Debug)]
pub enum FeedEvent {
    /// The game's documents may have changed. Also sent once right after
    /// subscribing and after the feed recovers from an error.
    Changed,
    /// The feed could not read the store; it keeps retrying on its own.
    Error(StorageError),
}

/// Callback invoked for every feed notification. It must return quickly.
pub type FeedListener = Arc<dyn Fn(FeedEvent) + Send + Sync>;

/// Abstraction over the document store holding players and their score cards.
///
/// Documents are last-write-wins; a score is keyed by `(game, player, stop)`
/// so writing it again replaces the previous value.
pub trait ScoreStore: Send + Sync {
    /// Read every player and score of `game` in one pass.
    fn fetch_snapshot(&self, game: &GameId) -> BoxFuture<'static, StorageResult<SnapshotEntity>>;
    /// Look a player up by id within `game`.
    fn find_player(
        &self,
        game: &GameId,
        player_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Create or replace a player document.
    fn save_player(
        &self,
        game: &GameId,
        player: PlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove a player document, returning whether it existed.
    fn delete_player(&self, game: &GameId, player_id: &str) -> BoxFuture<'static, StorageResult<bool>>;
    /// Write the score of one stop, replacing any previous value.
    fn upsert_score(
        &self,
        game: &GameId,
        score: ScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete every score of a player, returning how many were removed.
    fn reset_scores(&self, game: &GameId, player_id: &str) -> BoxFuture<'static, StorageResult<usize>>;
    /// Start pushing change notifications for `game` to `listener` until the handle is dropped.
    ///
    /// The first notification is [`FeedEvent::Changed`]. Must be called from
    /// within a Tokio runtime.
    fn subscribe(&self, game: &GameId, listener: FeedListener) -> Subscription;
    /// Cheap round trip telling whether the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish whatever the backend needs after an outage.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
