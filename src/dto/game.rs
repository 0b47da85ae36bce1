use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::format_system_time,
    state::{
        difficulty::Difficulty,
        digits::Score,
        history::FinishedGame,
        state_machine::{GameMode, GamePhase, GameSnapshot, GuessOutcome, GuessRecord},
    },
};

/// Lifecycle phase as exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameStateDto {
    /// Created, not started.
    Waiting,
    /// Accepting guesses.
    Playing,
    /// Over.
    Finished,
}

impl From<GamePhase> for GameStateDto {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Waiting => GameStateDto::Waiting,
            GamePhase::Playing => GameStateDto::Playing,
            GamePhase::Finished => GameStateDto::Finished,
        }
    }
}

/// Difficulty of an agent game as exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyDto {
    Easy,
    Normal,
    Hard,
    Expert,
}

impl From<Difficulty> for DifficultyDto {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => DifficultyDto::Easy,
            Difficulty::Normal => DifficultyDto::Normal,
            Difficulty::Hard => DifficultyDto::Hard,
            Difficulty::Expert => DifficultyDto::Expert,
        }
    }
}

impl From<DifficultyDto> for Difficulty {
    fn from(value: DifficultyDto) -> Self {
        match value {
            DifficultyDto::Easy => Difficulty::Easy,
            DifficultyDto::Normal => Difficulty::Normal,
            DifficultyDto::Hard => Difficulty::Hard,
            DifficultyDto::Expert => Difficulty::Expert,
        }
    }
}

/// Strike/ball pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScoreDto {
    pub strikes: usize,
    pub balls: usize,
}

impl From<Score> for ScoreDto {
    fn from(value: Score) -> Self {
        Self {
            strikes: value.strikes,
            balls: value.balls,
        }
    }
}

/// One entry of the guess history.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuessRecordDto {
    pub player_id: String,
    pub guess: Vec<u8>,
    pub result: ScoreDto,
    pub round: u32,
}

impl From<GuessRecord> for GuessRecordDto {
    fn from(value: GuessRecord) -> Self {
        Self {
            player_id: value.player,
            guess: value.guess,
            result: value.score.into(),
            round: value.round,
        }
    }
}

/// Public projection of a game. Never carries the secret.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub digit_count: usize,
    pub game_state: GameStateDto,
    pub round: u32,
    pub max_rounds: u32,
    pub remaining_rounds: u32,
    pub current_player: Option<String>,
    pub defender: Option<String>,
    pub attacker: Option<String>,
    pub guess_history: Vec<GuessRecordDto>,
    pub winner: Option<String>,
    #[serde(rename = "isAIGame")]
    pub is_ai_game: bool,
    /// False while a two-player defender has not chosen the secret yet.
    pub secret_chosen: bool,
    /// Only present for agent games started with a difficulty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<DifficultyDto>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

impl From<GameSnapshot> for GameInfo {
    fn from(value: GameSnapshot) -> Self {
        Self {
            digit_count: value.digit_count,
            game_state: value.phase.into(),
            round: value.round,
            max_rounds: value.max_rounds,
            remaining_rounds: value.remaining_rounds,
            current_player: value.current_turn,
            defender: value.defender,
            attacker: value.attacker,
            guess_history: value.history.into_iter().map(Into::into).collect(),
            winner: value.winner,
            is_ai_game: value.mode == GameMode::Agent,
            secret_chosen: value.secret_chosen,
            difficulty: value.difficulty.map(Into::into),
            created_at: format_system_time(value.created_at),
            finished_at: value.finished_at.map(format_system_time),
        }
    }
}

/// Feedback for a single accepted guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuessResultDto {
    pub strikes: usize,
    pub balls: usize,
    pub game_over: bool,
    pub timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl From<&GuessOutcome> for GuessResultDto {
    fn from(value: &GuessOutcome) -> Self {
        Self {
            strikes: value.score.strikes,
            balls: value.score.balls,
            game_over: value.game_over,
            timed_out: value.timed_out,
            winner: value.winner.clone(),
        }
    }
}

/// A finished game kept for the history listing, secret included.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinishedGameDto {
    pub game_id: String,
    pub game_info: GameInfo,
    pub secret_number: Vec<u8>,
}

impl From<FinishedGame> for FinishedGameDto {
    fn from(value: FinishedGame) -> Self {
        Self {
            game_id: value.game_id,
            game_info: value.snapshot.into(),
            secret_number: value.secret,
        }
    }
}

/// Recently finished games, newest first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameHistoryResponse {
    pub games: Vec<FinishedGameDto>,
}
