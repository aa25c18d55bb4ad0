use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, put},
};
use axum_valid::Valid;

use crate::{
    dto::player::{
        PlayerSummary, PlayersResponse, RegisterPlayerRequest, TeamsResponse, UpdatePlayerRequest,
    },
    error::AppError,
    routes::players::player_key,
    services::player_service,
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only player management endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/players", get(list_players).post(register_player))
        .route(
            "/admin/players/{id}",
            put(update_player).delete(delete_player),
        )
        .route("/admin/teams", get(list_teams))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Every registered player.
#[utoipa::path(
    get,
    path = "/admin/players",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    responses((status = 200, description = "Registered players", body = PlayersResponse))
)]
pub async fn list_players(
    State(state): State<SharedState>,
) -> Result<Json<PlayersResponse>, AppError> {
    Ok(Json(player_service::list(&state).await?))
}

/// Register a player under their phone number.
#[utoipa::path(
    post,
    path = "/admin/players",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    request_body = RegisterPlayerRequest,
    responses(
        (status = 201, description = "Player registered", body = PlayerSummary),
        (status = 409, description = "Phone number already registered")
    )
)]
pub async fn register_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RegisterPlayerRequest>>,
) -> Result<(StatusCode, Json<PlayerSummary>), AppError> {
    let player = player_service::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

/// Rename a player or change their team.
#[utoipa::path(
    put,
    path = "/admin/players/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token"),
    ("id" = String, Path, description = "Player phone number")),
    request_body = UpdatePlayerRequest,
    responses(
        (status = 200, description = "Player updated", body = PlayerSummary),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn update_player(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<UpdatePlayerRequest>>,
) -> Result<Json<PlayerSummary>, AppError> {
    Ok(Json(
        player_service::update(&state, &player_key(id), payload).await?,
    ))
}

/// Remove a player.
#[utoipa::path(
    delete,
    path = "/admin/players/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token"),
    ("id" = String, Path, description = "Player phone number")),
    responses(
        (status = 204, description = "Player deleted"),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    player_service::delete(&state, &player_key(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Distinct team names.
#[utoipa::path(
    get,
    path = "/admin/teams",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    responses((status = 200, description = "Team names", body = TeamsResponse))
)]
pub async fn list_teams(State(state): State<SharedState>) -> Result<Json<TeamsResponse>, AppError> {
    Ok(Json(player_service::teams(&state).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    match state.config().admin_token.as_deref() {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin access is disabled: no admin token configured".into(),
        )),
    }
}
