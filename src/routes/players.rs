use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        player::{LoginRequest, PlayersResponse, SessionResponse},
        score::{ResetResponse, ScoreCardDto, ScoreSubmittedResponse, SubmitScoreRequest},
        validation::normalize_phone,
    },
    error::AppError,
    services::{player_service, score_service},
    state::SharedState,
};

/// Player-facing routes: login, scorecard and score entry.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", post(login))
        .route("/players", get(list_players))
        .route("/players/{id}/card", get(get_card))
        .route("/players/{id}/scores", delete(reset_scores))
        .route("/players/{id}/scores/{stop_id}", put(submit_score))
}

/// Accept the player id either normalised or as a raw phone number.
pub(crate) fn player_key(raw: String) -> String {
    normalize_phone(&raw).unwrap_or(raw)
}

/// Open a session for a registered phone number.
#[utoipa::path(
    post,
    path = "/session",
    tag = "players",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Player found", body = SessionResponse),
        (status = 400, description = "Malformed phone number"),
        (status = 404, description = "No player registered with this number")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoginRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(player_service::login(&state, payload).await?))
}

/// Joined players and their count.
#[utoipa::path(
    get,
    path = "/players",
    tag = "players",
    responses((status = 200, description = "Joined players", body = PlayersResponse))
)]
pub async fn list_players(
    State(state): State<SharedState>,
) -> Result<Json<PlayersResponse>, AppError> {
    Ok(Json(player_service::list(&state).await?))
}

/// Personal scorecard with rank and progress.
#[utoipa::path(
    get,
    path = "/players/{id}/card",
    tag = "players",
    params(("id" = String, Path, description = "Player phone number")),
    responses(
        (status = 200, description = "Scorecard", body = ScoreCardDto),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_card(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ScoreCardDto>, AppError> {
    Ok(Json(score_service::card(&state, &player_key(id)).await?))
}

/// Record the sips taken at a stop, replacing any earlier value.
#[utoipa::path(
    put,
    path = "/players/{id}/scores/{stop_id}",
    tag = "players",
    params(
        ("id" = String, Path, description = "Player phone number"),
        ("stop_id" = String, Path, description = "Stop identifier")
    ),
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Score stored", body = ScoreSubmittedResponse),
        (status = 404, description = "Unknown player or stop")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    Path((id, stop_id)): Path<(String, String)>,
    Json(payload): Json<SubmitScoreRequest>,
) -> Result<Json<ScoreSubmittedResponse>, AppError> {
    let response =
        score_service::submit(&state, &player_key(id), &stop_id, payload.strokes).await?;
    Ok(Json(response))
}

/// Clear every score of the player.
#[utoipa::path(
    delete,
    path = "/players/{id}/scores",
    tag = "players",
    params(("id" = String, Path, description = "Player phone number")),
    responses(
        (status = 200, description = "Card reset", body = ResetResponse),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn reset_scores(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ResetResponse>, AppError> {
    Ok(Json(score_service::reset(&state, &player_key(id)).await?))
}
