//! Recomputation of the published leaderboard.
//!
//! Manual refreshes, score submissions and store notifications all end up in
//! [`apply_snapshot`]: a full recomputation from one snapshot, published only
//! if its ticket is still the newest.

use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::SnapshotEntity,
        score_store::{FeedEvent, FeedListener},
        storage::StorageError,
    },
    error::ServiceError,
    leaderboard::{compute_leaderboard, model::GameSnapshot},
    services::sse_events,
    state::{AppState, PublishedBoard, RefreshTicket, RefreshTrigger, SharedState},
};

/// Notice attached to the leaderboard while the data feed is failing.
pub const FEED_WARNING: &str =
    "Live scores may be offline or blocked; showing the last known leaderboard.";

/// Current published leaderboard, possibly flagged with a warning.
pub async fn current(state: &SharedState) -> Arc<PublishedBoard> {
    state.leaderboard().current().await
}

/// Fetch a fresh snapshot and republish the leaderboard.
///
/// Returns the leaderboard being served afterwards. On failure the previous
/// board is kept and flagged, and the error is returned.
pub async fn refresh(
    state: &SharedState,
    trigger: RefreshTrigger,
) -> Result<Arc<PublishedBoard>, ServiceError> {
    let ticket = state.leaderboard().begin(trigger);
    refresh_with(state, ticket).await
}

/// Read a snapshot under an already issued ticket and publish it.
///
/// The ticket must have been taken before this call so that a later ticket
/// always belongs to a later read.
async fn refresh_with(
    state: &SharedState,
    ticket: RefreshTicket,
) -> Result<Arc<PublishedBoard>, ServiceError> {
    let store = match state.require_score_store().await {
        Ok(store) => store,
        Err(err) => {
            record_failure(state, ticket, &err.to_string()).await;
            return Err(err);
        }
    };

    match store.fetch_snapshot(state.game_id()).await {
        Ok(entity) => Ok(apply_snapshot(state, ticket, entity).await),
        Err(err) => {
            warn!(
                game_id = %state.game_id(),
                generation = ticket.generation,
                trigger = ticket.trigger.as_str(),
                error = %err,
                "leaderboard refresh failed"
            );
            record_failure(state, ticket, &err.to_string()).await;
            Err(err.into())
        }
    }
}

/// Recompute from `entity` and publish under `ticket`.
///
/// When a newer ticket already won, the newer board is returned unchanged.
async fn apply_snapshot(
    state: &SharedState,
    ticket: RefreshTicket,
    entity: SnapshotEntity,
) -> Arc<PublishedBoard> {
    let snapshot = GameSnapshot::from(entity);
    let board = compute_leaderboard(state.course(), &snapshot);
    let recovering = state.leaderboard().current().await.warning.is_some();

    let Some(published) = state.leaderboard().publish(ticket, board).await else {
        return state.leaderboard().current().await;
    };

    debug!(
        game_id = %state.game_id(),
        generation = published.generation,
        trigger = ticket.trigger.as_str(),
        players = published.board.players.len(),
        "leaderboard published"
    );
    if recovering {
        info!(game_id = %state.game_id(), "score feed recovered");
        sse_events::broadcast_feed_status(state, None);
    }
    sse_events::broadcast_leaderboard(state, &published);
    if state.record_player_count(snapshot.players.len()) {
        sse_events::broadcast_player_count(state, snapshot.players.len());
    }
    published
}

async fn record_failure(state: &SharedState, ticket: RefreshTicket, cause: &str) {
    let Some(published) = state.leaderboard().mark_stale(ticket, FEED_WARNING).await else {
        return;
    };
    debug!(
        game_id = %state.game_id(),
        generation = published.generation,
        cause,
        "leaderboard kept with warning"
    );
    sse_events::broadcast_feed_status(state, Some(FEED_WARNING));
    sse_events::broadcast_leaderboard(state, &published);
}

/// Listener turning store notifications into recomputations.
///
/// The ticket is taken in the callback itself, before the snapshot is read,
/// so notification order is preserved and a read that started earlier can
/// never win over a later one. The work runs on a spawned task and the
/// callback returns at once.
fn feed_listener(state: Weak<AppState>) -> FeedListener {
    Arc::new(move |event| {
        let Some(state) = state.upgrade() else {
            return;
        };
        let ticket = state.leaderboard().begin(RefreshTrigger::StoreNotification);
        tokio::spawn(async move {
            match event {
                FeedEvent::Changed => {
                    // failures are already recorded on the board
                    let _ = refresh_with(&state, ticket).await;
                }
                FeedEvent::Error(err) => on_feed_error(&state, ticket, &err).await,
            }
        });
    })
}

/// Subscribe to the installed store, replacing any previous subscription.
pub async fn start_feed(state: &SharedState) -> Result<(), ServiceError> {
    let store = state.require_score_store().await?;
    let subscription = store.subscribe(state.game_id(), feed_listener(Arc::downgrade(state)));
    let previous = state.feed().lock().await.replace(subscription);
    if let Some(previous) = previous {
        previous.unsubscribe();
    }
    info!(game_id = %state.game_id(), "score feed started");
    Ok(())
}

/// Stop listening to the store. Returns whether a subscription was running.
pub async fn stop_feed(state: &SharedState) -> bool {
    let Some(subscription) = state.feed().lock().await.take() else {
        return false;
    };
    subscription.unsubscribe();
    info!(game_id = %state.game_id(), "score feed stopped");
    true
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    use futures::future::BoxFuture;
    use tokio::sync::Notify;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{PlayerEntity, ScoreEntity},
            score_store::{ScoreStore, Subscription, memory::MemoryScoreStore},
            storage::StorageResult,
        },
        leaderboard::model::GameId,
        state::AppState,
    };

    /// Memory store whose first snapshot is read at call time but handed back
    /// only once `release` is notified.
    struct SlowFirstRead {
        inner: MemoryScoreStore,
        pending: AtomicBool,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl ScoreStore for SlowFirstRead {
        fn fetch_snapshot(
            &self,
            game: &GameId,
        ) -> BoxFuture<'static, StorageResult<SnapshotEntity>> {
            let read = self.inner.fetch_snapshot(game);
            if !self.pending.swap(false, Ordering::SeqCst) {
                return read;
            }
            self.entered.notify_one();
            let release = self.release.clone();
            Box::pin(async move {
                release.notified().await;
                read.await
            })
        }

        fn find_player(
            &self,
            game: &GameId,
            player_id: &str,
        ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
            self.inner.find_player(game, player_id)
        }

        fn save_player(
            &self,
            game: &GameId,
            player: PlayerEntity,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_player(game, player)
        }

        fn delete_player(
            &self,
            game: &GameId,
            player_id: &str,
        ) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.delete_player(game, player_id)
        }

        fn upsert_score(
            &self,
            game: &GameId,
            score: ScoreEntity,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.upsert_score(game, score)
        }

        fn reset_scores(
            &self,
            game: &GameId,
            player_id: &str,
        ) -> BoxFuture<'static, StorageResult<usize>> {
            self.inner.reset_scores(game, player_id)
        }

        fn subscribe(&self, game: &GameId, listener: FeedListener) -> Subscription {
            self.inner.subscribe(game, listener)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    async fn state_with(store: &MemoryScoreStore) -> SharedState {
        let state = AppState::new(AppConfig::builtin().unwrap());
        state.set_score_store(Arc::new(store.clone())).await;
        state
    }

    async fn seed(store: &MemoryScoreStore, state: &SharedState, player: &str, strokes: u32) {
        store
            .save_player(
                state.game_id(),
                PlayerEntity {
                    id: Some(player.into()),
                    name: Some(player.into()),
                    team: None,
                    joined_at: None,
                },
            )
            .await
            .unwrap();
        store
            .upsert_score(
                state.game_id(),
                ScoreEntity {
                    player_id: Some(player.into()),
                    stop_id: Some("as".into()),
                    strokes: Some(strokes),
                    recorded_at: None,
                },
            )
            .await
            .unwrap();
    }

    async fn wait_for<F>(state: &SharedState, predicate: F) -> Arc<PublishedBoard>
    where
        F: Fn(&PublishedBoard) -> bool,
    {
        for _ in 0..100 {
            let current = state.leaderboard().current().await;
            if predicate(&current) {
                return current;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("leaderboard never reached the expected state");
    }

    #[tokio::test]
    async fn manual_refresh_publishes_the_store_contents() {
        let store = MemoryScoreStore::new();
        let state = state_with(&store).await;
        seed(&store, &state, "alice", 6).await;

        let published = refresh(&state, RefreshTrigger::Manual).await.unwrap();
        assert_eq!(published.board.players[0].total, 6);
        assert_eq!(published.trigger, Some(RefreshTrigger::Manual));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_board_with_warning() {
        let store = MemoryScoreStore::new();
        let state = state_with(&store).await;
        seed(&store, &state, "alice", 6).await;
        refresh(&state, RefreshTrigger::Manual).await.unwrap();

        store.set_online(false);
        assert!(refresh(&state, RefreshTrigger::Manual).await.is_err());

        let current = current(&state).await;
        assert_eq!(current.warning.as_deref(), Some(FEED_WARNING));
        assert_eq!(current.board.players[0].total, 6);
    }

    #[tokio::test]
    async fn feed_notifications_recompute_the_board() {
        let store = MemoryScoreStore::new();
        let state = state_with(&store).await;
        start_feed(&state).await.unwrap();

        seed(&store, &state, "bob", 4).await;
        let published = wait_for(&state, |board| {
            board.board.players.first().is_some_and(|row| row.total == 4)
        })
        .await;
        assert_eq!(published.trigger, Some(RefreshTrigger::StoreNotification));

        store.set_online(false);
        wait_for(&state, |board| board.warning.is_some()).await;
        store.set_online(true);
        let recovered = wait_for(&state, |board| board.warning.is_none()).await;
        assert_eq!(recovered.board.players[0].total, 4);

        assert!(stop_feed(&state).await);
        assert!(!stop_feed(&state).await);
    }

    #[tokio::test]
    async fn notification_read_before_a_write_never_replaces_a_later_refresh() {
        let inner = MemoryScoreStore::new();
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let state = AppState::new(AppConfig::builtin().unwrap());
        state
            .set_score_store(Arc::new(SlowFirstRead {
                inner: inner.clone(),
                pending: AtomicBool::new(true),
                entered: entered.clone(),
                release: release.clone(),
            }))
            .await;
        seed(&inner, &state, "alice", 6).await;

        // the notification reads the old card and stalls
        feed_listener(Arc::downgrade(&state))(FeedEvent::Changed);
        entered.notified().await;

        seed(&inner, &state, "alice", 3).await;
        let fresh = refresh(&state, RefreshTrigger::Manual).await.unwrap();
        assert_eq!(fresh.board.players[0].total, 3);

        release.notify_one();
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        let current = current(&state).await;
        assert_eq!(current.generation, fresh.generation);
        assert_eq!(current.board.players[0].total, 3);
    }

    #[tokio::test]
    async fn degraded_refresh_reports_degraded() {
        let state = AppState::new(AppConfig::builtin().unwrap());
        assert!(matches!(
            refresh(&state, RefreshTrigger::Manual).await,
            Err(ServiceError::Degraded)
        ));
        assert!(current(&state).await.warning.is_some());
    }
}
