use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: &'static str,
    /// Game served by this instance.
    pub game_id: String,
    /// Whether the live store subscription is currently running.
    pub feed_active: bool,
}

impl HealthResponse {
    /// Build the payload from the degraded flag and feed state.
    pub fn new(degraded: bool, game_id: String, feed_active: bool) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" },
            game_id,
            feed_active,
        }
    }
}
