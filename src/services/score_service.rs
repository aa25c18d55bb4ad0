use std::time::SystemTime;

use tracing::{debug, info};

use crate::{
    dao::models::ScoreEntity,
    dto::score::{ResetResponse, ScoreCardDto, ScoreSubmittedResponse},
    error::ServiceError,
    leaderboard::card::ScoreCard,
    services::leaderboard_service,
    state::{PublishedBoard, RefreshTrigger, SharedState},
};

async fn ensure_player(state: &SharedState, player_id: &str) -> Result<(), ServiceError> {
    let store = state.require_score_store().await?;
    store
        .find_player(state.game_id(), player_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServiceError::UnknownPlayer(player_id.to_string()))
}

fn card_from(
    state: &SharedState,
    published: &PublishedBoard,
    player_id: &str,
) -> Option<ScoreCardDto> {
    ScoreCard::from_board(state.course(), &published.board, player_id).map(Into::into)
}

/// Record (or overwrite) a player's score for one stop, clamped to the configured range.
///
/// The leaderboard is recomputed before returning so the card reflects the new value.
pub async fn submit(
    state: &SharedState,
    player_id: &str,
    stop_id: &str,
    raw_strokes: i64,
) -> Result<ScoreSubmittedResponse, ServiceError> {
    if state.course().stop(stop_id).is_none() {
        return Err(ServiceError::UnknownStop(stop_id.to_string()));
    }
    ensure_player(state, player_id).await?;

    let strokes = state.config().strokes.clamp(raw_strokes);
    let clamped = i64::from(strokes) != raw_strokes;
    if clamped {
        debug!(player_id, stop_id, raw_strokes, strokes, "score clamped");
    }

    let store = state.require_score_store().await?;
    store
        .upsert_score(
            state.game_id(),
            ScoreEntity {
                player_id: Some(player_id.to_string()),
                stop_id: Some(stop_id.to_string()),
                strokes: Some(strokes),
                recorded_at: Some(SystemTime::now()),
            },
        )
        .await?;
    info!(game_id = %state.game_id(), player_id, stop_id, strokes, "score recorded");

    let published = leaderboard_service::refresh(state, RefreshTrigger::ScoreSubmitted).await?;
    let card = card_from(state, &published, player_id)
        .ok_or_else(|| ServiceError::UnknownPlayer(player_id.to_string()))?;

    Ok(ScoreSubmittedResponse {
        player_id: player_id.to_string(),
        stop_id: stop_id.to_string(),
        strokes,
        clamped,
        card,
    })
}

/// Delete every score of a player and recompute the leaderboard.
pub async fn reset(state: &SharedState, player_id: &str) -> Result<ResetResponse, ServiceError> {
    ensure_player(state, player_id).await?;
    let store = state.require_score_store().await?;
    let removed = store.reset_scores(state.game_id(), player_id).await?;
    info!(game_id = %state.game_id(), player_id, removed, "score card reset");

    leaderboard_service::refresh(state, RefreshTrigger::ScoreSubmitted).await?;
    Ok(ResetResponse {
        player_id: player_id.to_string(),
        removed,
    })
}

/// Scorecard of a player from the published leaderboard.
///
/// A player missing from the board (just registered, or nothing published yet)
/// triggers one manual refresh before giving up.
pub async fn card(state: &SharedState, player_id: &str) -> Result<ScoreCardDto, ServiceError> {
    let published = leaderboard_service::current(state).await;
    if let Some(card) = card_from(state, &published, player_id) {
        return Ok(card);
    }

    let published = leaderboard_service::refresh(state, RefreshTrigger::Manual).await?;
    card_from(state, &published, player_id)
        .ok_or_else(|| ServiceError::UnknownPlayer(player_id.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::PlayerEntity,
            score_store::{ScoreStore, memory::MemoryScoreStore},
        },
        state::AppState,
    };

    async fn setup() -> (MemoryScoreStore, SharedState) {
        let store = MemoryScoreStore::new();
        let state = AppState::new(AppConfig::builtin().unwrap());
        state.set_score_store(Arc::new(store.clone())).await;
        store
            .save_player(
                state.game_id(),
                PlayerEntity {
                    id: Some("+15550000001".into()),
                    name: Some("Alice".into()),
                    team: None,
                    joined_at: Some(SystemTime::now()),
                },
            )
            .await
            .unwrap();
        (store, state)
    }

    #[tokio::test]
    async fn resubmission_replaces_previous_value() {
        let (_store, state) = setup().await;
        submit(&state, "+15550000001", "as", 5).await.unwrap();
        let response = submit(&state, "+15550000001", "as", 2).await.unwrap();

        assert_eq!(response.card.total, 2);
        assert_eq!(response.card.stops[0].result.as_deref(), Some("Birdie"));
        assert_eq!(response.card.next_stop.as_deref(), Some("pmans"));
        assert_eq!(response.card.rank_label, "1");
    }

    #[tokio::test]
    async fn out_of_range_values_are_clamped() {
        let (_store, state) = setup().await;
        let high = submit(&state, "+15550000001", "as", 99).await.unwrap();
        assert_eq!(high.strokes, 20);
        assert!(high.clamped);

        let low = submit(&state, "+15550000001", "dogs", -3).await.unwrap();
        assert_eq!(low.strokes, 1);
        assert!(low.clamped);

        let fine = submit(&state, "+15550000001", "cafe", 4).await.unwrap();
        assert!(!fine.clamped);
    }

    #[tokio::test]
    async fn unknown_stop_or_player_is_not_found() {
        let (_store, state) = setup().await;
        assert!(matches!(
            submit(&state, "+15550000001", "nowhere", 3).await,
            Err(ServiceError::UnknownStop(_))
        ));
        assert!(matches!(
            submit(&state, "+15559999999", "as", 3).await,
            Err(ServiceError::UnknownPlayer(_))
        ));
    }

    #[tokio::test]
    async fn reset_clears_the_card() {
        let (_store, state) = setup().await;
        submit(&state, "+15550000001", "as", 3).await.unwrap();
        submit(&state, "+15550000001", "dogs", 2).await.unwrap();

        let reset = reset(&state, "+15550000001").await.unwrap();
        assert_eq!(reset.removed, 2);

        let card = card(&state, "+15550000001").await.unwrap();
        assert_eq!(card.total, 0);
        assert_eq!(card.rank_label, "--");
        assert_eq!(card.next_stop.as_deref(), Some("as"));
        assert!(!card.finished);
    }

    #[tokio::test]
    async fn card_refreshes_when_player_is_missing_from_board() {
        let (_store, state) = setup().await;
        let card = card(&state, "+15550000001").await.unwrap();
        assert_eq!(card.display_name, "Alice");
        assert_eq!(card.total_players, 1);
        assert_eq!(card.stops.len(), 9);
    }
}
