//! Background task owning the score store connection of one game.
//!
//! The game starts degraded. Once a store connects, the feed is started and the
//! board published; the store is then health-checked periodically. A failed
//! check gets a few reconnect attempts before the store is dropped and the whole cycle
//! starts over.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{score_store::ScoreStore, storage::StorageError},
    services::{leaderboard_service, sse_events},
    state::{RefreshTrigger, SharedState},
};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Exponential delay between connection attempts, capped at ten seconds.
#[derive(Debug, Clone, Copy)]
struct Backoff {
    next: Duration,
}

impl Backoff {
    const INITIAL: Duration = Duration::from_millis(1_000);
    const MAX: Duration = Duration::from_secs(10);

    fn new() -> Self {
        Self {
            next: Self::INITIAL,
        }
    }

    async fn wait(&mut self) {
        sleep(self.next).await;
        self.next = (self.next * 2).min(Self::MAX);
    }
}

fn set_degraded(state: &SharedState, degraded: bool) {
    if state.update_degraded(degraded) {
        sse_events::broadcast_system_status(state, degraded);
    }
}

/// Install a freshly connected store: leave degraded mode, start the feed and publish once.
async fn install(state: &SharedState, store: Arc<dyn ScoreStore>) {
    state.set_score_store(store).await;
    sse_events::broadcast_system_status(state, false);
    if let Err(err) = leaderboard_service::start_feed(state).await {
        warn!(game_id = %state.game_id(), error = %err, "unable to start score feed");
    }
    if let Err(err) = leaderboard_service::refresh(state, RefreshTrigger::Manual).await {
        warn!(game_id = %state.game_id(), error = %err, "initial leaderboard refresh failed");
    }
}

/// Stop the feed and forget the store after reconnecting gave up.
async fn uninstall(state: &SharedState) {
    leaderboard_service::stop_feed(state).await;
    state.clear_score_store().await;
    sse_events::broadcast_system_status(state, true);
}

/// Try to revive `store` after a failed health check. Degraded mode is entered on the first failure.
async fn reconnect(state: &SharedState, store: &Arc<dyn ScoreStore>) -> bool {
    let mut backoff = Backoff::new();
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(game_id = %state.game_id(), attempt, "storage reconnected");
                return true;
            }
            Err(err) => {
                warn!(game_id = %state.game_id(), attempt, error = %err, "storage reconnect attempt failed");
                if attempt == 0 {
                    set_degraded(state, true);
                }
                backoff.wait().await;
            }
        }
    }
    false
}

/// Health-check `store` until it is lost for good.
async fn watch(state: &SharedState, store: Arc<dyn ScoreStore>) {
    loop {
        if store.health_check().await.is_err() && !reconnect(state, &store).await {
            return;
        }
        if state.is_degraded() {
            info!(game_id = %state.game_id(), "storage healthy again; leaving degraded mode");
            set_degraded(state, false);
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Connect to the storage backend and keep the shared state in degraded mode while it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ScoreStore>, StorageError>> + Send,
{
    let mut backoff = Backoff::new();
    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(game_id = %state.game_id(), error = %err, "storage connection attempt failed");
                backoff.wait().await;
                continue;
            }
        };

        install(&state, store.clone()).await;
        info!(game_id = %state.game_id(), "storage connection established; leaving degraded mode");
        backoff = Backoff::new();

        watch(&state, store).await;
        warn!(game_id = %state.game_id(), "exhausted storage reconnect attempts; dropping the connection");
        uninstall(&state).await;
        backoff.wait().await;
    }
}
