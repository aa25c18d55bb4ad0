/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Leaderboard recomputation and live feed wiring.
pub mod leaderboard_service;
/// Player login and administration.
pub mod player_service;
/// Score submission, reset and scorecards.
pub mod score_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor with exponential backoff.
pub mod storage_supervisor;
