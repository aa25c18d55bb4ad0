//! Process-local score store used for single-node play and tests.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::{
    dao::{
        models::{PlayerEntity, ScoreEntity, SnapshotEntity},
        score_store::{FeedEvent, FeedListener, ScoreStore, Subscription},
        storage::{StorageError, StorageResult},
    },
    leaderboard::model::GameId,
};

const CHANGE_CAPACITY: usize = 64;

/// Failure reported while the store is switched offline.
#[derive(Debug, Error)]
#[error("in-memory store is offline")]
pub struct OfflineError;

#[derive(Debug, Default)]
struct GameDocuments {
    players: IndexMap<String, PlayerEntity>,
    scores: IndexMap<(String, String), ScoreEntity>,
}

struct Inner {
    games: DashMap<GameId, GameDocuments>,
    /// `None` notifies every game at once.
    changes: broadcast::Sender<Option<GameId>>,
    online: AtomicBool,
}

/// Score store keeping every document in memory.
#[derive(Clone)]
pub struct MemoryScoreStore {
    inner: Arc<Inner>,
}

impl Default for MemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScoreStore {
    /// Build an empty, online store.
    pub fn new() -> Self {
        let (changes, _receiver) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                games: DashMap::new(),
                changes,
                online: AtomicBool::new(true),
            }),
        }
    }

    /// Simulate losing or regaining the backend. Subscribers are notified either way.
    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::SeqCst);
        let _ = self.inner.changes.send(None);
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.inner.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::unavailable(
                "in-memory store switched offline".into(),
                OfflineError,
            ))
        }
    }

    fn notify(&self, game: &GameId) {
        let _ = self.inner.changes.send(Some(game.clone()));
    }

    fn snapshot_now(&self, game: &GameId) -> StorageResult<SnapshotEntity> {
        self.ensure_online()?;
        Ok(self
            .inner
            .games
            .get(game)
            .map(|docs| SnapshotEntity {
                players: docs.players.values().cloned().collect(),
                scores: docs.scores.values().cloned().collect(),
            })
            .unwrap_or_default())
    }

    fn emit(&self, listener: &FeedListener) {
        match self.ensure_online() {
            Ok(()) => listener(FeedEvent::Changed),
            Err(err) => listener(FeedEvent::Error(err)),
        }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn fetch_snapshot(&self, game: &GameId) -> BoxFuture<'static, StorageResult<SnapshotEntity>> {
        let result = self.snapshot_now(game);
        Box::pin(async move { result })
    }

    fn find_player(
        &self,
        game: &GameId,
        player_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let result = self.ensure_online().map(|()| {
            self.inner
                .games
                .get(game)
                .and_then(|docs| docs.players.get(player_id).cloned())
        });
        Box::pin(async move { result })
    }

    fn save_player(
        &self,
        game: &GameId,
        player: PlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.ensure_online().map(|()| {
            let key = player.id.clone().unwrap_or_default();
            self.inner
                .games
                .entry(game.clone())
                .or_default()
                .players
                .insert(key, player);
            self.notify(game);
        });
        Box::pin(async move { result })
    }

    fn delete_player(&self, game: &GameId, player_id: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let result = self.ensure_online().map(|()| {
            let removed = self
                .inner
                .games
                .get_mut(game)
                .and_then(|mut docs| docs.players.shift_remove(player_id))
                .is_some();
            if removed {
                self.notify(game);
            }
            removed
        });
        Box::pin(async move { result })
    }

    fn upsert_score(
        &self,
        game: &GameId,
        score: ScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.ensure_online().map(|()| {
            let key = (
                score.player_id.clone().unwrap_or_default(),
                score.stop_id.clone().unwrap_or_default(),
            );
            self.inner
                .games
                .entry(game.clone())
                .or_default()
                .scores
                .insert(key, score);
            self.notify(game);
        });
        Box::pin(async move { result })
    }

    fn reset_scores(&self, game: &GameId, player_id: &str) -> BoxFuture<'static, StorageResult<usize>> {
        let result = self.ensure_online().map(|()| {
            let removed = self
                .inner
                .games
                .get_mut(game)
                .map(|mut docs| {
                    let before = docs.scores.len();
                    docs.scores.retain(|(owner, _), _| owner != player_id);
                    before - docs.scores.len()
                })
                .unwrap_or(0);
            if removed > 0 {
                self.notify(game);
            }
            removed
        });
        Box::pin(async move { result })
    }

    fn subscribe(&self, game: &GameId, listener: FeedListener) -> Subscription {
        let mut receiver = self.inner.changes.subscribe();
        let store = self.clone();
        let game = game.clone();

        let task = tokio::spawn(async move {
            store.emit(&listener);
            loop {
                match receiver.recv().await {
                    Ok(Some(changed)) if changed != game => continue,
                    Ok(_) => store.emit(&listener),
                    Err(RecvError::Lagged(skipped)) => {
                        // Several changes collapsed into one; a fresh snapshot covers them all.
                        debug!(game_id = %game, skipped, "memory feed lagged");
                        store.emit(&listener);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Subscription::new(task)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.ensure_online();
        Box::pin(async move { result })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}
