use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::game::{DifficultyDto, GameInfo, GuessResultDto};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
/// Messages accepted from player WebSocket clients, framed as `{"event": ..., "data": ...}`.
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// Open a game against the scripted agent, optionally choosing the digit count and difficulty.
    #[serde(rename = "startAIGame")]
    StartAiGame(Option<AgentGameOptions>),
    /// Replace the sender's agent game with a fresh one using the same settings.
    #[serde(rename = "restartGame")]
    RestartGame,
    /// Open a two-player game as defender.
    #[serde(rename = "createGame")]
    CreateGame(Option<usize>),
    /// Take the attacker seat of an existing two-player game.
    #[serde(rename = "joinGame")]
    JoinGame(String),
    /// Choose the secret of the two-player game the sender defends.
    #[serde(rename = "setSecret")]
    SetSecret(Vec<u8>),
    /// Guess the secret of the sender's current game.
    #[serde(rename = "makeGuess")]
    MakeGuess(Vec<u8>),
    /// Leave the current game without closing the socket.
    #[serde(rename = "leaveGame")]
    LeaveGame,
}

/// Data of `startAIGame`: either a bare digit count or an options object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AgentGameOptions {
    DigitCount(usize),
    Detailed {
        #[serde(default, rename = "digitCount")]
        digit_count: Option<usize>,
        #[serde(default)]
        difficulty: Option<DifficultyDto>,
    },
}

impl AgentGameOptions {
    /// Requested digit count, if any.
    pub fn digit_count(&self) -> Option<usize> {
        match self {
            AgentGameOptions::DigitCount(count) => Some(*count),
            AgentGameOptions::Detailed { digit_count, .. } => *digit_count,
        }
    }

    /// Requested difficulty, if any.
    pub fn difficulty(&self) -> Option<DifficultyDto> {
        match self {
            AgentGameOptions::DigitCount(_) => None,
            AgentGameOptions::Detailed { difficulty, .. } => *difficulty,
        }
    }
}

impl ClientMessage {
    /// Parse a text frame.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Named event pushed to WebSocket clients.
pub struct ServerEvent {
    pub event: String,
    pub data: serde_json::Value,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the data field.
    pub fn json<T>(event: &str, payload: &T) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        Ok(Self {
            event: event.to_string(),
            data: serde_json::to_value(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Sent to a socket right after the upgrade, carrying its player identifier.
pub struct ConnectedPayload {
    pub player_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast when a game has been opened.
pub struct GameStartedPayload {
    pub game_id: String,
    pub game_info: GameInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast when a player took the attacker seat.
pub struct PlayerJoinedPayload {
    pub game_id: String,
    pub player_id: String,
    pub game_info: GameInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast once the defender has chosen the secret.
pub struct SecretSetPayload {
    pub game_info: GameInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast after a human guess was scored.
pub struct GuessResultPayload {
    pub player_id: String,
    pub guess: Vec<u8>,
    pub result: GuessResultDto,
    /// Round the game is in after this guess.
    pub round: u32,
    pub game_info: GameInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast after the scripted agent played.
pub struct AgentGuessPayload {
    pub guess: Vec<u8>,
    pub result: GuessResultDto,
    pub game_info: GameInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast when a game ends; the only payload revealing the secret.
pub struct GameOverPayload {
    pub winner: Option<String>,
    pub game_info: GameInfo,
    pub secret_number: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast to the remaining members when someone leaves.
pub struct PlayerLeftPayload {
    pub game_id: String,
    pub player_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Sent to the originating socket when a request fails.
pub struct ErrorPayload {
    pub message: String,
}
