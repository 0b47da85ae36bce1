use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::{GameInfo, GuessResultDto},
        ws::{
            AgentGuessPayload, ConnectedPayload, ErrorPayload, GameOverPayload,
            GameStartedPayload, GuessResultPayload, PlayerJoinedPayload, PlayerLeftPayload,
            SecretSetPayload, ServerEvent,
        },
    },
    state::{
        SharedState,
        state_machine::{GameMode, GameStateMachine, GuessOutcome},
    },
};

const EVENT_CONNECTED: &str = "connected";
const EVENT_AI_GAME_STARTED: &str = "aiGameStarted";
const EVENT_GAME_CREATED: &str = "gameCreated";
const EVENT_PLAYER_JOINED: &str = "playerJoined";
const EVENT_SECRET_SET: &str = "secretSet";
const EVENT_GUESS_RESULT: &str = "guessResult";
const EVENT_AI_GUESS: &str = "aiGuess";
const EVENT_GAME_OVER: &str = "gameOver";
const EVENT_PLAYER_LEFT: &str = "playerLeft";
const EVENT_ERROR: &str = "error";

/// Greet a freshly upgraded socket with its player identifier.
pub fn send_connected(state: &SharedState, player_id: &str) {
    let payload = ConnectedPayload {
        player_id: player_id.to_string(),
    };
    send_player_event(state, player_id, EVENT_CONNECTED, &payload);
}

/// Report a failed request to the socket that sent it.
pub fn send_error(state: &SharedState, player_id: &str, message: &str) {
    let payload = ErrorPayload {
        message: message.to_string(),
    };
    send_player_event(state, player_id, EVENT_ERROR, &payload);
}

/// Announce a new game to its members (`aiGameStarted` or `gameCreated`).
pub fn broadcast_game_started(state: &SharedState, game_id: &str, game: &GameStateMachine) {
    let event = match game.mode() {
        GameMode::Agent => EVENT_AI_GAME_STARTED,
        GameMode::TwoPlayer => EVENT_GAME_CREATED,
    };
    let payload = GameStartedPayload {
        game_id: game_id.to_string(),
        game_info: info(game),
    };
    send_game_event(state, game_id, event, &payload);
}

/// Announce that `player_id` took the attacker seat.
pub fn broadcast_player_joined(
    state: &SharedState,
    game_id: &str,
    player_id: &str,
    game: &GameStateMachine,
) {
    let payload = PlayerJoinedPayload {
        game_id: game_id.to_string(),
        player_id: player_id.to_string(),
        game_info: info(game),
    };
    send_game_event(state, game_id, EVENT_PLAYER_JOINED, &payload);
}

/// Announce that the defender locked in the secret.
pub fn broadcast_secret_set(state: &SharedState, game_id: &str, game: &GameStateMachine) {
    let payload = SecretSetPayload {
        game_info: info(game),
    };
    send_game_event(state, game_id, EVENT_SECRET_SET, &payload);
}

/// Broadcast the score of a human guess.
pub fn broadcast_guess_result(
    state: &SharedState,
    game_id: &str,
    player_id: &str,
    guess: &[u8],
    outcome: &GuessOutcome,
    game: &GameStateMachine,
) {
    let game_info = info(game);
    let payload = GuessResultPayload {
        player_id: player_id.to_string(),
        guess: guess.to_vec(),
        result: GuessResultDto::from(outcome),
        round: game_info.round,
        game_info,
    };
    send_game_event(state, game_id, EVENT_GUESS_RESULT, &payload);
}

/// Broadcast the score of the scripted agent's guess.
pub fn broadcast_agent_guess(
    state: &SharedState,
    game_id: &str,
    guess: &[u8],
    outcome: &GuessOutcome,
    game: &GameStateMachine,
) {
    let payload = AgentGuessPayload {
        guess: guess.to_vec(),
        result: GuessResultDto::from(outcome),
        game_info: info(game),
    };
    send_game_event(state, game_id, EVENT_AI_GUESS, &payload);
}

/// Broadcast the end of a game, revealing the secret.
pub fn broadcast_game_over(state: &SharedState, game_id: &str, game: &GameStateMachine) {
    let game_info = info(game);
    let payload = GameOverPayload {
        winner: game_info.winner.clone(),
        secret_number: game.reveal_secret().map(<[u8]>::to_vec).unwrap_or_default(),
        game_info,
    };
    send_game_event(state, game_id, EVENT_GAME_OVER, &payload);
}

/// Tell the remaining members that `player_id` left.
pub fn broadcast_player_left(state: &SharedState, game_id: &str, player_id: &str) {
    let payload = PlayerLeftPayload {
        game_id: game_id.to_string(),
        player_id: player_id.to_string(),
    };
    send_game_event(state, game_id, EVENT_PLAYER_LEFT, &payload);
}

fn info(game: &GameStateMachine) -> GameInfo {
    game.snapshot().into()
}

fn send_game_event<T>(state: &SharedState, game_id: &str, event: &str, payload: &T)
where
    T: Serialize,
{
    let Some(frame) = frame(event, payload) else {
        return;
    };
    for member in state.registry().members(game_id) {
        state.send_to_player(&member, &frame);
    }
}

fn send_player_event<T>(state: &SharedState, player_id: &str, event: &str, payload: &T)
where
    T: Serialize,
{
    if let Some(frame) = frame(event, payload) {
        state.send_to_player(player_id, &frame);
    }
}

fn frame<T>(event: &str, payload: &T) -> Option<ServerEvent>
where
    T: Serialize,
{
    match ServerEvent::json(event, payload) {
        Ok(frame) => Some(frame),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize event payload");
            None
        }
    }
}
