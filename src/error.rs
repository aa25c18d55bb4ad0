use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Failures of the player, score and leaderboard services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The store answered with an error.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// No store is installed; the supervisor is still trying to connect.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Input that passed deserialization but makes no sense.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No player with this id in the game.
    #[error("player `{0}` is not registered")]
    UnknownPlayer(String),
    /// No stop with this id on the course.
    #[error("stop `{0}` is not on the course")]
    UnknownStop(String),
    /// A player already holds this phone number.
    #[error("a player is already registered with {0}")]
    AlreadyRegistered(String),
    /// A stored player record lost the fields needed to present it.
    #[error("stored player record is unusable: {0}")]
    UnusableRecord(&'static str),
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or invalid input (400).
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Missing or wrong admin token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Unknown player or stop (404).
    #[error("not found: {0}")]
    NotFound(String),
    /// The resource already exists (409).
    #[error("conflict: {0}")]
    Conflict(String),
    /// Store unreachable or not connected yet (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Anything else (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Storage(StorageError::Corrupt { .. })
            | ServiceError::UnusableRecord(_) => AppError::Internal(message),
            ServiceError::Storage(_) | ServiceError::Degraded => {
                AppError::ServiceUnavailable(message)
            }
            ServiceError::InvalidInput(_) => AppError::BadRequest(message),
            ServiceError::UnknownPlayer(_) | ServiceError::UnknownStop(_) => {
                AppError::NotFound(message)
            }
            ServiceError::AlreadyRegistered(_) => AppError::Conflict(message),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            message: self.to_string(),
        });
        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn service_errors_map_to_http_statuses() {
        let cases = [
            (ServiceError::Degraded, StatusCode::SERVICE_UNAVAILABLE),
            (
                ServiceError::Storage(StorageError::unavailable(
                    "down".into(),
                    io::Error::other("refused"),
                )),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ServiceError::Storage(StorageError::corrupt(
                    "bad json".into(),
                    io::Error::other("eof"),
                )),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ServiceError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::UnknownPlayer("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::UnknownStop("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::AlreadyRegistered("x".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn unknown_player_message_names_the_player() {
        let err = AppError::from(ServiceError::UnknownPlayer("+15550000001".into()));
        assert_eq!(err.to_string(), "not found: player `+15550000001` is not registered");
    }
}
