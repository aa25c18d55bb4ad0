use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{course::CourseResponse, leaderboard::LeaderboardResponse},
    error::AppError,
    services::leaderboard_service,
    state::{RefreshTrigger, SharedState},
};

/// Leaderboard and course routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leaderboard", get(get_leaderboard))
        .route("/leaderboard/refresh", post(refresh_leaderboard))
        .route("/course", get(get_course))
}

/// Currently published leaderboard. Served even while the feed is failing, with a warning.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    responses((status = 200, description = "Published leaderboard", body = LeaderboardResponse))
)]
pub async fn get_leaderboard(State(state): State<SharedState>) -> Json<LeaderboardResponse> {
    let published = leaderboard_service::current(&state).await;
    Json(LeaderboardResponse::new(
        state.game_id().as_str(),
        state.course(),
        &published,
    ))
}

/// Recompute the leaderboard from a fresh snapshot.
#[utoipa::path(
    post,
    path = "/leaderboard/refresh",
    tag = "leaderboard",
    responses(
        (status = 200, description = "Leaderboard after the refresh", body = LeaderboardResponse),
        (status = 503, description = "Store unreachable; the previous leaderboard is kept")
    )
)]
pub async fn refresh_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let published = leaderboard_service::refresh(&state, RefreshTrigger::Manual).await?;
    Ok(Json(LeaderboardResponse::new(
        state.game_id().as_str(),
        state.course(),
        &published,
    )))
}

/// Stops of the course in play order.
#[utoipa::path(
    get,
    path = "/course",
    tag = "leaderboard",
    responses((status = 200, description = "Course definition", body = CourseResponse))
)]
pub async fn get_course(State(state): State<SharedState>) -> Json<CourseResponse> {
    Json(CourseResponse::from(state.config()))
}
