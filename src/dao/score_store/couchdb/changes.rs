//! `_changes` follower turning database changes into game notifications.

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    dao::score_store::{FeedEvent, FeedListener},
    leaderboard::model::GameId,
};

use super::{error::CouchResult, models::belongs_to_game, store::CouchScoreStore};

/// Render a CouchDB sequence (string on 2.x+, integer on 1.x) as a query value.
pub(super) fn seq_param(seq: &Value) -> String {
    match seq {
        Value::String(seq) => seq.clone(),
        other => other.to_string(),
    }
}

/// Long-poll the database from `since`, yielding `true` for every page that
/// touched one of the game's documents.
fn game_changes(
    store: CouchScoreStore,
    game: GameId,
    mut since: Value,
) -> impl Stream<Item = CouchResult<bool>> {
    stream! {
        loop {
            match store.poll_changes(&since).await {
                Ok(page) => {
                    let relevant = page.results.iter().any(|row| belongs_to_game(&row.id, &game));
                    since = page.last_seq;
                    yield Ok(relevant);
                }
                Err(err) => {
                    yield Err(err);
                    tokio::time::sleep(store.feed_retry()).await;
                }
            }
        }
    }
}

/// Drive a subscription until the surrounding task is aborted.
pub(super) async fn run_feed(store: CouchScoreStore, game: GameId, listener: FeedListener) {
    // The sequence is read before announcing the initial state, so any write
    // the listener's first read misses shows up on the feed.
    let since = loop {
        match store.update_seq().await {
            Ok(seq) => break seq,
            Err(err) => {
                warn!(game_id = %game, error = %err, "unable to start CouchDB change feed");
                listener(FeedEvent::Error(err.into()));
                tokio::time::sleep(store.feed_retry()).await;
            }
        }
    };

    listener(FeedEvent::Changed);

    let changes = game_changes(store.clone(), game.clone(), since);
    futures::pin_mut!(changes);
    // After a failure the next good page re-emits so listeners can clear their warning.
    let mut recovering = false;
    while let Some(page) = changes.next().await {
        match page {
            Ok(relevant) if relevant || recovering => {
                recovering = false;
                listener(FeedEvent::Changed);
            }
            Ok(_) => debug!(game_id = %game, "change feed page without game documents"),
            Err(err) => {
                warn!(game_id = %game, error = %err, "CouchDB change feed interrupted");
                recovering = true;
                listener(FeedEvent::Error(err.into()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sequences_render_without_quotes() {
        assert_eq!(seq_param(&json!("12-abc")), "12-abc");
        assert_eq!(seq_param(&json!(42)), "42");
    }
}
