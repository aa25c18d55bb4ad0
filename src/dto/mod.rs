use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Course description served to clients.
pub mod course;
/// Health endpoint payload.
pub mod health;
pub mod leaderboard;
pub mod player;
/// Score submission and scorecard payloads.
pub mod score;
/// Server-sent event payloads.
pub mod sse;
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
