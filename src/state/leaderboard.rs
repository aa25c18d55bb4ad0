//! Published leaderboard guarded by refresh generations.
//!
//! Every recomputation takes a ticket before it reads the store. Tickets are
//! strictly increasing, and a result is only published when its ticket is newer
//! than the one behind the current board, so a slow computation that started
//! earlier can never overwrite a later one.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::SystemTime,
};

use tokio::sync::RwLock;
use tracing::debug;

use crate::leaderboard::Leaderboard;

/// What caused a recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Explicit refresh requested by a client.
    Manual,
    /// A player submitted or reset their own scores.
    ScoreSubmitted,
    /// The store subscription reported a change.
    StoreNotification,
}

impl RefreshTrigger {
    /// Stable name used in logs and payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshTrigger::Manual => "manual",
            RefreshTrigger::ScoreSubmitted => "score_submitted",
            RefreshTrigger::StoreNotification => "store_notification",
        }
    }
}

/// Claim on a recomputation slot, taken before the snapshot is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    /// Position of this refresh in issue order.
    pub generation: u64,
    /// Why the refresh was started.
    pub trigger: RefreshTrigger,
}

/// Leaderboard as currently served.
#[derive(Debug, Clone)]
pub struct PublishedBoard {
    /// Generation of the ticket that produced this state; 0 before the first refresh.
    pub generation: u64,
    /// Ranked players and teams.
    pub board: Arc<Leaderboard>,
    /// Cause of the refresh that produced `board`; `None` before the first one.
    pub trigger: Option<RefreshTrigger>,
    /// When the board itself was last computed.
    pub computed_at: Option<SystemTime>,
    /// Set while the feed is failing; the board is then the last good one.
    pub warning: Option<String>,
}

/// Holder of the published leaderboard.
pub struct LeaderboardView {
    next_generation: AtomicU64,
    published: RwLock<Arc<PublishedBoard>>,
}

impl Default for LeaderboardView {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaderboardView {
    /// Empty view at generation 0.
    pub fn new() -> Self {
        Self {
            next_generation: AtomicU64::new(1),
            published: RwLock::new(Arc::new(PublishedBoard {
                generation: 0,
                board: Arc::new(Leaderboard::default()),
                trigger: None,
                computed_at: None,
                warning: None,
            })),
        }
    }

    /// Take the next ticket. Must be called before reading the snapshot.
    pub fn begin(&self, trigger: RefreshTrigger) -> RefreshTicket {
        RefreshTicket {
            generation: self.next_generation.fetch_add(1, Ordering::SeqCst),
            trigger,
        }
    }

    /// Publish a freshly computed board. Returns `None` when a newer ticket already won.
    pub async fn publish(
        &self,
        ticket: RefreshTicket,
        board: Leaderboard,
    ) -> Option<Arc<PublishedBoard>> {
        let mut guard = self.published.write().await;
        if ticket.generation <= guard.generation {
            debug!(
                generation = ticket.generation,
                published = guard.generation,
                trigger = ticket.trigger.as_str(),
                "discarding stale leaderboard"
            );
            return None;
        }

        let next = Arc::new(PublishedBoard {
            generation: ticket.generation,
            board: Arc::new(board),
            trigger: Some(ticket.trigger),
            computed_at: Some(SystemTime::now()),
            warning: None,
        });
        *guard = next.clone();
        Some(next)
    }

    /// Record a failed refresh: the last good board stays, flagged with `warning`.
    ///
    /// Subject to the same ordering as [`LeaderboardView::publish`].
    pub async fn mark_stale(
        &self,
        ticket: RefreshTicket,
        warning: impl Into<String>,
    ) -> Option<Arc<PublishedBoard>> {
        let mut guard = self.published.write().await;
        if ticket.generation <= guard.generation {
            return None;
        }

        let next = Arc::new(PublishedBoard {
            generation: ticket.generation,
            board: guard.board.clone(),
            trigger: Some(ticket.trigger),
            computed_at: guard.computed_at,
            warning: Some(warning.into()),
        });
        *guard = next.clone();
        Some(next)
    }

    /// Board currently served, possibly flagged stale.
    pub async fn current(&self) -> Arc<PublishedBoard> {
        self.published.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::{
        compute_leaderboard,
        model::{Course, GameSnapshot, Player, ScoreEntry, Stop},
    };

    fn board_with_total(strokes: u32) -> Leaderboard {
        let course = Course::new(vec![Stop {
            id: "as".into(),
            name: "A's".into(),
            drink: String::new(),
            emoji: String::new(),
            par: 3,
            sequence_index: 0,
        }])
        .unwrap();
        let mut snapshot = GameSnapshot::default();
        snapshot.players.push(Player {
            id: "p".into(),
            display_name: "P".into(),
            team: None,
            joined_at: None,
        });
        snapshot.scores_by_player.insert(
            "p".into(),
            vec![ScoreEntry {
                stop_id: "as".into(),
                strokes,
                recorded_at: None,
            }],
        );
        compute_leaderboard(&course, &snapshot)
    }

    #[tokio::test]
    async fn starts_empty() {
        let view = LeaderboardView::new();
        let current = view.current().await;
        assert_eq!(current.generation, 0);
        assert!(current.board.players.is_empty());
        assert!(current.warning.is_none());
    }

    #[tokio::test]
    async fn late_stale_result_never_replaces_newer_one() {
        let view = LeaderboardView::new();
        let slow = view.begin(RefreshTrigger::StoreNotification);
        let fast = view.begin(RefreshTrigger::ScoreSubmitted);

        assert!(view.publish(fast, board_with_total(4)).await.is_some());
        assert!(view.publish(slow, board_with_total(9)).await.is_none());

        let current = view.current().await;
        assert_eq!(current.generation, fast.generation);
        assert_eq!(current.board.players[0].total, 4);
        assert_eq!(current.trigger, Some(RefreshTrigger::ScoreSubmitted));
    }

    #[tokio::test]
    async fn failure_keeps_last_good_board_until_next_success() {
        let view = LeaderboardView::new();
        let first = view.begin(RefreshTrigger::Manual);
        view.publish(first, board_with_total(5)).await;

        let failed = view.begin(RefreshTrigger::StoreNotification);
        let stale = view.mark_stale(failed, "offline").await.unwrap();
        assert_eq!(stale.board.players[0].total, 5);
        assert_eq!(stale.warning.as_deref(), Some("offline"));

        let retry = view.begin(RefreshTrigger::StoreNotification);
        let fresh = view.publish(retry, board_with_total(6)).await.unwrap();
        assert!(fresh.warning.is_none());
        assert_eq!(fresh.board.players[0].total, 6);
    }

    #[tokio::test]
    async fn stale_failure_does_not_flag_newer_board() {
        let view = LeaderboardView::new();
        let old = view.begin(RefreshTrigger::StoreNotification);
        let new = view.begin(RefreshTrigger::Manual);
        view.publish(new, board_with_total(2)).await;

        assert!(view.mark_stale(old, "offline").await.is_none());
        assert!(view.current().await.warning.is_none());
    }
}
