use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the pub golf backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::leaderboard::get_leaderboard,
        crate::routes::leaderboard::refresh_leaderboard,
        crate::routes::leaderboard::get_course,
        crate::routes::players::login,
        crate::routes::players::list_players,
        crate::routes::players::get_card,
        crate::routes::players::submit_score,
        crate::routes::players::reset_scores,
        crate::routes::admin::list_players,
        crate::routes::admin::register_player,
        crate::routes::admin::update_player,
        crate::routes::admin::delete_player,
        crate::routes::admin::list_teams,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::course::CourseResponse,
            crate::dto::course::StopDto,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::leaderboard::StopColumn,
            crate::dto::leaderboard::PlayerRowDto,
            crate::dto::leaderboard::TeamRowDto,
            crate::dto::player::LoginRequest,
            crate::dto::player::RegisterPlayerRequest,
            crate::dto::player::UpdatePlayerRequest,
            crate::dto::player::PlayerSummary,
            crate::dto::player::SessionResponse,
            crate::dto::player::PlayersResponse,
            crate::dto::player::TeamsResponse,
            crate::dto::score::SubmitScoreRequest,
            crate::dto::score::ScoreSubmittedResponse,
            crate::dto::score::ResetResponse,
            crate::dto::score::ScoreCardDto,
            crate::dto::score::CardStopDto,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::FeedStatusEvent,
            crate::dto::sse::PlayerCountEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "leaderboard", description = "Published standings and course layout"),
        (name = "players", description = "Player sessions, scorecards and score entry"),
        (name = "admin", description = "Player management, guarded by the admin token"),
    )
)]
pub struct ApiDoc;
