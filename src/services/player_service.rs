use std::{collections::BTreeSet, time::SystemTime};

use tracing::{info, warn};

use crate::{
    dao::models::PlayerEntity,
    dto::{
        player::{
            LoginRequest, PlayerSummary, PlayersResponse, RegisterPlayerRequest, SessionResponse,
            TeamsResponse, UpdatePlayerRequest,
        },
        validation::normalize_phone,
    },
    error::ServiceError,
    leaderboard::model::{GameSnapshot, Player, normalize_team},
    services::sse_events,
    state::SharedState,
};

fn parse_phone(raw: &str) -> Result<String, ServiceError> {
    normalize_phone(raw).ok_or_else(|| {
        ServiceError::InvalidInput("phone number must contain exactly 10 digits".into())
    })
}

fn summary(entity: PlayerEntity) -> Result<PlayerSummary, ServiceError> {
    PlayerSummary::try_from(entity).map_err(|reason| {
        warn!(reason, "stored player record is unusable");
        ServiceError::UnusableRecord(reason)
    })
}

/// Look up a registered player by phone number.
pub async fn login(
    state: &SharedState,
    request: LoginRequest,
) -> Result<SessionResponse, ServiceError> {
    let phone = parse_phone(&request.phone)?;
    let store = state.require_score_store().await?;
    let entity = store
        .find_player(state.game_id(), &phone)
        .await?
        .ok_or_else(|| ServiceError::UnknownPlayer(phone.clone()))?;

    let player = summary(entity)?;
    info!(game_id = %state.game_id(), player_id = %player.id, "player logged in");
    Ok(SessionResponse {
        player,
        game_id: state.game_id().to_string(),
    })
}

/// Register a new player; the phone number becomes their identity.
pub async fn register(
    state: &SharedState,
    request: RegisterPlayerRequest,
) -> Result<PlayerSummary, ServiceError> {
    let phone = parse_phone(&request.phone)?;
    let store = state.require_score_store().await?;
    if store.find_player(state.game_id(), &phone).await?.is_some() {
        return Err(ServiceError::AlreadyRegistered(phone));
    }

    let entity = PlayerEntity {
        id: Some(phone),
        name: Some(request.name.trim().to_string()),
        team: normalize_team(request.team.as_deref()),
        joined_at: Some(SystemTime::now()),
    };
    store.save_player(state.game_id(), entity.clone()).await?;

    let player = summary(entity)?;
    info!(game_id = %state.game_id(), player_id = %player.id, team = ?player.team, "player registered");
    Ok(player)
}

/// Rename a player or move them between teams. Their scores stay as they are.
pub async fn update(
    state: &SharedState,
    player_id: &str,
    request: UpdatePlayerRequest,
) -> Result<PlayerSummary, ServiceError> {
    let store = state.require_score_store().await?;
    let mut entity = store
        .find_player(state.game_id(), player_id)
        .await?
        .ok_or_else(|| ServiceError::UnknownPlayer(player_id.to_string()))?;

    if let Some(name) = request.name {
        entity.name = Some(name.trim().to_string());
    }
    if let Some(team) = request.team {
        entity.team = normalize_team(team.as_deref());
    }
    store.save_player(state.game_id(), entity.clone()).await?;

    let player = summary(entity)?;
    info!(game_id = %state.game_id(), player_id, team = ?player.team, "player updated");
    Ok(player)
}

/// Remove a player. Their score documents are left behind and ignored by the leaderboard.
pub async fn delete(state: &SharedState, player_id: &str) -> Result<(), ServiceError> {
    let store = state.require_score_store().await?;
    if !store.delete_player(state.game_id(), player_id).await? {
        return Err(ServiceError::UnknownPlayer(player_id.to_string()));
    }
    info!(game_id = %state.game_id(), player_id, "player deleted");
    Ok(())
}

async fn players(state: &SharedState) -> Result<Vec<Player>, ServiceError> {
    let store = state.require_score_store().await?;
    let snapshot = GameSnapshot::from(store.fetch_snapshot(state.game_id()).await?);
    let mut players = snapshot.players;
    players.sort_by(|a, b| {
        (a.joined_at.is_none(), a.joined_at, &a.id).cmp(&(b.joined_at.is_none(), b.joined_at, &b.id))
    });
    Ok(players)
}

/// Joined players in registration order.
pub async fn list(state: &SharedState) -> Result<PlayersResponse, ServiceError> {
    let players = players(state).await?;
    if state.record_player_count(players.len()) {
        sse_events::broadcast_player_count(state, players.len());
    }
    Ok(PlayersResponse {
        count: players.len(),
        players: players.iter().map(PlayerSummary::from).collect(),
    })
}

/// Distinct team names in use, sorted.
pub async fn teams(state: &SharedState) -> Result<TeamsResponse, ServiceError> {
    let teams: BTreeSet<String> = players(state)
        .await?
        .into_iter()
        .filter_map(|player| player.team)
        .collect();
    Ok(TeamsResponse {
        teams: teams.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::score_store::memory::MemoryScoreStore, services::score_service,
        state::AppState,
    };

    async fn setup() -> SharedState {
        let state = AppState::new(AppConfig::builtin().unwrap());
        state
            .set_score_store(Arc::new(MemoryScoreStore::new()))
            .await;
        state
    }

    fn registration(name: &str, phone: &str, team: Option<&str>) -> RegisterPlayerRequest {
        RegisterPlayerRequest {
            name: name.into(),
            phone: phone.into(),
            team: team.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn register_then_login_with_any_formatting() {
        let state = setup().await;
        let player = register(&state, registration(" Alice ", "555-000-0001", Some(" Hawks ")))
            .await
            .unwrap();
        assert_eq!(player.id, "+15550000001");
        assert_eq!(player.display_name, "Alice");
        assert_eq!(player.team.as_deref(), Some("Hawks"));

        let session = login(
            &state,
            LoginRequest {
                phone: "(555) 000 0001".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(session.player.id, "+15550000001");
    }

    #[tokio::test]
    async fn duplicate_phone_is_a_conflict() {
        let state = setup().await;
        register(&state, registration("A", "5550000001", None))
            .await
            .unwrap();
        assert!(matches!(
            register(&state, registration("B", "5550000001", None)).await,
            Err(ServiceError::AlreadyRegistered(_))
        ));
    }

    #[tokio::test]
    async fn unknown_phone_cannot_log_in() {
        let state = setup().await;
        assert!(matches!(
            login(&state, LoginRequest { phone: "5550000009".into() }).await,
            Err(ServiceError::UnknownPlayer(_))
        ));
    }

    #[tokio::test]
    async fn team_change_keeps_scores() {
        let state = setup().await;
        register(&state, registration("A", "5550000001", Some("Eagles")))
            .await
            .unwrap();
        score_service::submit(&state, "+15550000001", "as", 4)
            .await
            .unwrap();

        let updated = update(
            &state,
            "+15550000001",
            UpdatePlayerRequest {
                name: None,
                team: Some(Some("Hawks".into())),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.team.as_deref(), Some("Hawks"));

        let card = score_service::card(&state, "+15550000001").await.unwrap();
        assert_eq!(card.total, 4);
    }

    #[tokio::test]
    async fn teams_are_distinct_and_players_listed_in_join_order() {
        let state = setup().await;
        register(&state, registration("A", "5550000001", Some("Hawks")))
            .await
            .unwrap();
        register(&state, registration("B", "5550000002", Some("Eagles")))
            .await
            .unwrap();
        register(&state, registration("C", "5550000003", Some("Hawks")))
            .await
            .unwrap();
        register(&state, registration("D", "5550000004", None))
            .await
            .unwrap();

        assert_eq!(teams(&state).await.unwrap().teams, ["Eagles", "Hawks"]);
        let listed = list(&state).await.unwrap();
        assert_eq!(listed.count, 4);
        let names: Vec<_> = listed.players.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn delete_unknown_player_is_not_found() {
        let state = setup().await;
        register(&state, registration("A", "5550000001", None))
            .await
            .unwrap();
        delete(&state, "+15550000001").await.unwrap();
        assert!(matches!(
            delete(&state, "+15550000001").await,
            Err(ServiceError::UnknownPlayer(_))
        ));
    }
}
