/// Published leaderboard and refresh ordering.
pub mod leaderboard;
mod sse;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::score_store::{ScoreStore, Subscription},
    error::ServiceError,
    leaderboard::model::{Course, GameId},
};

pub use self::leaderboard::{LeaderboardView, PublishedBoard, RefreshTicket, RefreshTrigger};
pub use self::sse::SseHub;

/// Handle shared by every route and background task.
pub type SharedState = Arc<AppState>;

const PUBLIC_SSE_CAPACITY: usize = 32;

/// Central state of one game instance: its configuration, store handle and published view.
///
/// Several instances can live in one process and share a store, each bound to
/// its own [`GameId`].
pub struct AppState {
    config: AppConfig,
    score_store: RwLock<Option<Arc<dyn ScoreStore>>>,
    public_sse: SseHub,
    leaderboard: LeaderboardView,
    feed: Mutex<Option<Subscription>>,
    degraded: watch::Sender<bool>,
    player_count: watch::Sender<Option<usize>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded, _rx) = watch::channel(true);
        let (player_count, _rx) = watch::channel(None);
        Arc::new(Self {
            config,
            score_store: RwLock::new(None),
            public_sse: SseHub::new(PUBLIC_SSE_CAPACITY),
            leaderboard: LeaderboardView::new(),
            feed: Mutex::new(None),
            degraded,
            player_count,
        })
    }

    /// Configuration the game was started with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Game this state is bound to.
    pub fn game_id(&self) -> &GameId {
        &self.config.game_id
    }

    /// Course being played.
    pub fn course(&self) -> &Arc<Course> {
        &self.config.course
    }

    /// Obtain a handle to the current score store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        self.score_store.read().await.clone()
    }

    /// Current score store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        self.score_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a score store implementation and leave degraded mode.
    pub async fn set_score_store(&self, store: Arc<dyn ScoreStore>) {
        *self.score_store.write().await = Some(store);
        self.update_degraded(false);
    }

    /// Remove the current score store and enter degraded mode.
    pub async fn clear_score_store(&self) {
        self.score_store.write().await.take();
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag, returning whether it changed.
    pub fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }

    /// Published leaderboard view.
    pub fn leaderboard(&self) -> &LeaderboardView {
        &self.leaderboard
    }

    /// Slot holding the live store subscription, if any.
    pub fn feed(&self) -> &Mutex<Option<Subscription>> {
        &self.feed
    }

    /// Remember the joined player count, returning whether it differs from the last one.
    pub fn record_player_count(&self, count: usize) -> bool {
        self.player_count.send_if_modified(|current| {
            if *current == Some(count) {
                return false;
            }
            *current = Some(count);
            true
        })
    }
}
