use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    dto::{
        leaderboard::LeaderboardResponse,
        sse::{FeedStatusEvent, Handshake, PlayerCountEvent, ServerEvent, SystemStatus},
    },
    state::{PublishedBoard, SharedState},
};

const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_LEADERBOARD: &str = "leaderboard";
const EVENT_FEED_STATUS: &str = "feed.status";
const EVENT_PLAYER_COUNT: &str = "players.count";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast a freshly published leaderboard.
pub fn broadcast_leaderboard(state: &SharedState, published: &PublishedBoard) {
    let payload = LeaderboardResponse::new(state.game_id().as_str(), state.course(), published);
    send_public_event(state, EVENT_LEADERBOARD, &payload);
}

/// Broadcast that the data feed went offline or came back.
pub fn broadcast_feed_status(state: &SharedState, message: Option<&str>) {
    let payload = FeedStatusEvent {
        online: message.is_none(),
        message: message.map(str::to_string),
    };
    send_public_event(state, EVENT_FEED_STATUS, &payload);
}

/// Broadcast the number of joined players.
pub fn broadcast_player_count(state: &SharedState, count: usize) {
    send_public_event(state, EVENT_PLAYER_COUNT, &PlayerCountEvent { count });
}

/// Broadcast the degraded flag.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

/// Build the handshake sent first on every new stream.
pub fn handshake_event(state: &SharedState) -> Option<ServerEvent> {
    let payload = Handshake {
        game_id: state.game_id().to_string(),
        degraded: state.is_degraded(),
    };
    ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &payload)
        .inspect_err(|err| warn!(error = %err, "failed to serialize handshake"))
        .ok()
}

/// Build the leaderboard event replayed to a client right after it connects.
pub fn leaderboard_event(state: &SharedState, published: &PublishedBoard) -> Option<ServerEvent> {
    let payload = LeaderboardResponse::new(state.game_id().as_str(), state.course(), published);
    ServerEvent::json(Some(EVENT_LEADERBOARD.to_string()), &payload)
        .inspect_err(|err| warn!(error = %err, "failed to serialize leaderboard"))
        .ok()
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(message) => {
            let receivers = state.public_sse().broadcast(message);
            debug!(event, receivers, "public SSE event sent");
        }
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
