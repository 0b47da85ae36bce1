//! DTO definitions used by the request/response action endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::{
    game::{DifficultyDto, GameInfo, GuessResultDto},
    validation::validate_digits,
};

/// Envelope of every call to `/api/action`: an action name plus its arguments.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

/// Arguments of the `startAIGame` action.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartAgentGameInput {
    #[serde(default)]
    #[validate(range(min = 1, max = 10))]
    pub digit_count: Option<usize>,
    #[validate(length(min = 1, max = 128))]
    pub player_id: String,
    /// Omitted for the plain random agent.
    #[serde(default)]
    pub difficulty: Option<DifficultyDto>,
}

/// Arguments of the `restartGame` action.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestartGameInput {
    #[validate(length(min = 1, max = 128))]
    pub game_id: String,
    #[validate(length(min = 1, max = 128))]
    pub player_id: String,
}

/// Arguments of the `makeGuess` action.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MakeGuessInput {
    pub game_id: String,
    pub guess: Vec<u8>,
    pub player_id: String,
}

impl Validate for MakeGuessInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.game_id.trim().is_empty() {
            errors.add("gameId", validator::ValidationError::new("required"));
        }
        if self.player_id.trim().is_empty() {
            errors.add("playerId", validator::ValidationError::new("required"));
        }
        if let Err(e) = validate_digits(&self.guess) {
            errors.add("guess", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Uniform response envelope of the action endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_info: Option<GameInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GuessResultDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    /// Successful `startAIGame` or `restartGame` response.
    pub fn started(game_id: String, game_info: GameInfo) -> Self {
        Self {
            success: true,
            game_id: Some(game_id),
            game_info: Some(game_info),
            result: None,
            error: None,
        }
    }

    /// Successful `makeGuess` response.
    pub fn guessed(result: GuessResultDto, game_info: GameInfo) -> Self {
        Self {
            success: true,
            game_id: None,
            game_info: Some(game_info),
            result: Some(result),
            error: None,
        }
    }

    /// Failure envelope.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            game_id: None,
            game_info: None,
            result: None,
            error: Some(message.into()),
        }
    }
}
