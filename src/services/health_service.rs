use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Build the health payload, probing the store so failures show up in the logs.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_score_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let feed_active = state
        .feed()
        .lock()
        .await
        .as_ref()
        .is_some_and(|subscription| subscription.is_active());

    HealthResponse::new(state.is_degraded(), state.game_id().to_string(), feed_active)
}
