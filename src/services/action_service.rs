use serde::de::DeserializeOwned;
use tracing::warn;
use validator::Validate;

use crate::{
    dto::action::{
        ActionRequest, ActionResponse, MakeGuessInput, RestartGameInput, StartAgentGameInput,
    },
    error::AppError,
    services::game_service::{self, AgentTurns},
    state::SharedState,
};

const ACTION_START_AI_GAME: &str = "startAIGame";
const ACTION_MAKE_GUESS: &str = "makeGuess";
const ACTION_RESTART_GAME: &str = "restartGame";

/// Execute one request/response action.
///
/// The agent never moves on this path; clients poll the game instead.
pub async fn handle_action(
    state: &SharedState,
    request: ActionRequest,
) -> Result<ActionResponse, AppError> {
    match request.action.as_str() {
        ACTION_START_AI_GAME => {
            let input: StartAgentGameInput = parse_input(request.data)?;
            let started = game_service::start_agent_game(
                state,
                &input.player_id,
                input.digit_count,
                input.difficulty.map(Into::into),
            )
            .await?;
            Ok(ActionResponse::started(started.game_id, started.info))
        }
        ACTION_RESTART_GAME => {
            let input: RestartGameInput = parse_input(request.data)?;
            let started =
                game_service::restart_game(state, &input.player_id, Some(&input.game_id)).await?;
            Ok(ActionResponse::started(started.game_id, started.info))
        }
        ACTION_MAKE_GUESS => {
            let input: MakeGuessInput = parse_input(request.data)?;
            let reply = game_service::make_guess(
                state,
                &input.player_id,
                Some(&input.game_id),
                input.guess,
                AgentTurns::Disabled,
            )
            .await?;
            Ok(ActionResponse::guessed(reply.result, reply.info))
        }
        other => {
            warn!(action = %other, "unknown action");
            Err(AppError::BadRequest("Unknown action".into()))
        }
    }
}

fn parse_input<T>(data: serde_json::Value) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let input: T = serde_json::from_value(data)?;
    input.validate()?;
    Ok(input)
}
