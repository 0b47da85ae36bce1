use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dto::action::ActionResponse,
    state::{digits::DigitsError, registry::RegistryError, state_machine::GameError},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The game rejected the action.
    #[error(transparent)]
    Game(#[from] GameError),
    /// Requested game does not exist.
    #[error("game `{0}` not found")]
    GameNotFound(String),
    /// The caller is not bound to any game.
    #[error("you are not in a game")]
    NotInGame,
    /// A transition produced an unexpected result.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::GameNotFound(id) => ServiceError::GameNotFound(id),
            RegistryError::NotInGame => ServiceError::NotInGame,
        }
    }
}

impl From<DigitsError> for ServiceError {
    fn from(err: DigitsError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("malformed request: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input or an action the game refused.
    #[error("{0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::GameNotFound(_) => AppError::NotFound(err.to_string()),
            ServiceError::InvalidInput(_) | ServiceError::Game(_) | ServiceError::NotInGame => {
                AppError::BadRequest(err.to_string())
            }
            ServiceError::Internal(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ActionResponse::failed(self.to_string()));

        (status, payload).into_response()
    }
}
