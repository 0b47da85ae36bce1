use tracing::{debug, info, warn};

use crate::{
    dto::game::{GameHistoryResponse, GameInfo, GuessResultDto},
    error::ServiceError,
    services::game_events,
    state::{
        SharedState,
        agent::Agent,
        difficulty::Difficulty,
        digits::generate_unique_digits,
        history::FinishedGame,
        registry::{GameId, LeaveOutcome},
        state_machine::{
            AGENT_ID, GameEvent, GameMode, GameNotice, GamePhase, GameStateMachine, GuessOutcome,
        },
    },
};

/// Whether a human guess in an agent game hands the turn to a delayed agent move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentTurns {
    /// Pass the turn to the agent and queue its move.
    Scheduled,
    /// Keep the turn with the human; the agent never plays.
    Disabled,
}

/// A freshly opened game.
#[derive(Debug, Clone)]
pub struct StartedGame {
    /// Identifier of the new game.
    pub game_id: GameId,
    /// Public view right after the start.
    pub info: GameInfo,
}

/// Result of an accepted human guess.
#[derive(Debug, Clone)]
pub struct GuessReply {
    /// Score and end-of-game flags.
    pub result: GuessResultDto,
    /// Public view after the guess.
    pub info: GameInfo,
}

/// Open a game against the scripted agent with a freshly drawn secret.
///
/// Without a difficulty the secret is uniform and the agent guesses at random.
pub async fn start_agent_game(
    state: &SharedState,
    player: &str,
    digit_count: Option<usize>,
    difficulty: Option<Difficulty>,
) -> Result<StartedGame, ServiceError> {
    let digit_count = resolve_digit_count(state, digit_count)?;
    leave_current_game(state, player).await;

    let secret = match difficulty {
        Some(level) => level.secret(digit_count, &mut rand::rng())?,
        None => generate_unique_digits(digit_count, &mut rand::rng())?,
    };
    debug!(player = %player, secret = ?secret, difficulty = ?difficulty, "drew agent game secret");

    let mut game = GameStateMachine::new(GameMode::Agent, digit_count, state.config().max_rounds())?
        .with_difficulty(difficulty);
    game.handle(GameEvent::Start {
        initiator: player.to_string(),
        secret: Some(secret),
    })?;

    open_game(state, player, game).await
}

/// Open a two-player game with `player` as defender. The secret is chosen later.
pub async fn create_two_player_game(
    state: &SharedState,
    player: &str,
    digit_count: Option<usize>,
) -> Result<StartedGame, ServiceError> {
    let digit_count = resolve_digit_count(state, digit_count)?;
    leave_current_game(state, player).await;

    let mut game =
        GameStateMachine::new(GameMode::TwoPlayer, digit_count, state.config().max_rounds())?;
    game.handle(GameEvent::Start {
        initiator: player.to_string(),
        secret: None,
    })?;

    open_game(state, player, game).await
}

async fn open_game(
    state: &SharedState,
    player: &str,
    game: GameStateMachine,
) -> Result<StartedGame, ServiceError> {
    let mode = game.mode();
    let digit_count = game.digit_count();
    let (game_id, shared) = state.registry().create_game(player, game);
    let game = shared.lock().await;

    info!(game_id = %game_id, player = %player, mode = ?mode, digit_count, "game started");
    game_events::broadcast_game_started(state, &game_id, &game);

    Ok(StartedGame {
        info: game.snapshot().into(),
        game_id,
    })
}

/// Seat `player` as attacker of an existing two-player game.
pub async fn join_game(
    state: &SharedState,
    player: &str,
    game_id: &str,
) -> Result<GameInfo, ServiceError> {
    if state.registry().game_of(player).as_deref() == Some(game_id) {
        return Err(ServiceError::InvalidInput("you are already in this game".into()));
    }
    let shared = state.registry().game(game_id)?;

    // Take the seat before leaving anything, so a refused join keeps the current game.
    shared.lock().await.handle(GameEvent::AddOpponent {
        joiner: player.to_string(),
    })?;
    leave_current_game(state, player).await;
    state.registry().bind(player, game_id);

    let game = shared.lock().await;
    info!(game_id = %game_id, player = %player, "player joined game");
    game_events::broadcast_player_joined(state, game_id, player, &game);

    Ok(game.snapshot().into())
}

/// Replace the agent game `player` attacks with a fresh one using the same digit count and difficulty.
///
/// Without an explicit `game_id` the game the player is bound to is used.
pub async fn restart_game(
    state: &SharedState,
    player: &str,
    game_id: Option<&str>,
) -> Result<StartedGame, ServiceError> {
    let game_id = resolve_game_id(state, player, game_id)?;
    let shared = state.registry().game(&game_id)?;
    let (digit_count, difficulty) = {
        let game = shared.lock().await;
        if game.mode() != GameMode::Agent || game.attacker() != Some(player) {
            return Err(ServiceError::InvalidInput(
                "only the player of an agent game can restart it".into(),
            ));
        }
        (game.digit_count(), game.difficulty())
    };

    info!(game_id = %game_id, player = %player, "restarting agent game");
    start_agent_game(state, player, Some(digit_count), difficulty).await
}

/// Lock in the secret of the two-player game `player` defends.
pub async fn set_secret(
    state: &SharedState,
    player: &str,
    secret: Vec<u8>,
) -> Result<GameInfo, ServiceError> {
    let game_id = state
        .registry()
        .game_of(player)
        .ok_or(ServiceError::NotInGame)?;
    let shared = state.registry().game(&game_id)?;

    let mut game = shared.lock().await;
    game.handle(GameEvent::SetSecret {
        player: player.to_string(),
        secret,
    })?;

    info!(game_id = %game_id, player = %player, "secret chosen");
    game_events::broadcast_secret_set(state, &game_id, &game);

    Ok(game.snapshot().into())
}

/// Score a human guess.
///
/// Without an explicit `game_id` the game the player is bound to is used.
pub async fn make_guess(
    state: &SharedState,
    player: &str,
    game_id: Option<&str>,
    guess: Vec<u8>,
    agent_turns: AgentTurns,
) -> Result<GuessReply, ServiceError> {
    let game_id = resolve_game_id(state, player, game_id)?;
    let shared = state.registry().game(&game_id)?;

    let mut game = shared.lock().await;
    let notices = game.handle(GameEvent::Guess {
        player: player.to_string(),
        guess,
    })?;
    let (guess, outcome) = scored_guess(notices)
        .ok_or_else(|| ServiceError::Internal("accepted guess produced no score".into()))?;

    info!(
        game_id = %game_id,
        player = %player,
        guess = ?guess,
        strikes = outcome.score.strikes,
        balls = outcome.score.balls,
        round = outcome.round,
        "guess scored"
    );

    let hand_over = !outcome.game_over
        && agent_turns == AgentTurns::Scheduled
        && game.mode() == GameMode::Agent;
    if hand_over {
        game.handle(GameEvent::PassTurn {
            player: AGENT_ID.to_string(),
        })?;
    }

    game_events::broadcast_guess_result(state, &game_id, player, &guess, &outcome, &game);

    if outcome.game_over {
        finish(state, &game_id, &game, &outcome);
    } else if hand_over {
        schedule_agent_turn(state, game_id.clone());
    }

    Ok(GuessReply {
        result: GuessResultDto::from(&outcome),
        info: game.snapshot().into(),
    })
}

fn schedule_agent_turn(state: &SharedState, game_id: GameId) {
    let task_state = state.clone();
    let task_game_id = game_id.clone();
    debug!(game_id = %game_id, delay = ?state.scheduler().delay(), "agent move scheduled");
    state.scheduler().schedule(game_id, async move {
        run_agent_turn(&task_state, &task_game_id).await;
    });
}

/// Play the agent's move if the game still exists and is waiting on the agent.
pub async fn run_agent_turn(state: &SharedState, game_id: &str) {
    let Ok(shared) = state.registry().game(game_id) else {
        debug!(game_id = %game_id, "game gone before agent move");
        return;
    };

    let mut game = shared.lock().await;
    // The game may have been removed while we waited for the lock.
    if state.registry().game(game_id).is_err() {
        debug!(game_id = %game_id, "game removed before agent move");
        return;
    }
    if game.phase() != GamePhase::Playing || game.current_turn() != Some(AGENT_ID) {
        debug!(game_id = %game_id, phase = ?game.phase(), "agent move no longer applicable");
        return;
    }

    let agent = Agent::new(game.difficulty());
    let event = match agent.guess_event(game.digit_count(), game.history(), &mut rand::rng()) {
        Ok(event) => event,
        Err(err) => {
            warn!(game_id = %game_id, error = %err, "agent could not produce a guess");
            return;
        }
    };
    let notices = match game.handle(event) {
        Ok(notices) => notices,
        Err(err) => {
            warn!(game_id = %game_id, error = %err, "agent guess rejected");
            return;
        }
    };
    let Some((guess, outcome)) = scored_guess(notices) else {
        warn!(game_id = %game_id, "agent guess produced no score");
        return;
    };

    info!(
        game_id = %game_id,
        guess = ?guess,
        strikes = outcome.score.strikes,
        balls = outcome.score.balls,
        round = outcome.round,
        "agent guess scored"
    );

    if !outcome.game_over {
        if let Some(attacker) = game.attacker().map(str::to_string) {
            if let Err(err) = game.handle(GameEvent::PassTurn { player: attacker }) {
                warn!(game_id = %game_id, error = %err, "failed to hand the turn back");
            }
        }
    }

    game_events::broadcast_agent_guess(state, game_id, &guess, &outcome, &game);
    if outcome.game_over {
        finish(state, game_id, &game, &outcome);
    }
}

fn finish(state: &SharedState, game_id: &str, game: &GameStateMachine, outcome: &GuessOutcome) {
    info!(
        game_id = %game_id,
        winner = ?outcome.winner,
        timed_out = outcome.timed_out,
        "game over"
    );
    state.scheduler().cancel(game_id);
    if let Some(finished) = FinishedGame::capture(game_id, game) {
        state.history().record(finished);
    }
    game_events::broadcast_game_over(state, game_id, game);
}

/// Remove `player` from its current game.
pub async fn leave_game(state: &SharedState, player: &str) -> Result<LeaveOutcome, ServiceError> {
    let outcome = state.registry().leave_game(player).await?;
    after_leave(state, player, &outcome);
    Ok(outcome)
}

/// Forget a closed socket: its connection, its session and its seat.
pub async fn disconnect(state: &SharedState, player: &str) {
    state.connections().remove(player);
    if let Some(outcome) = state.registry().disconnect(player).await {
        after_leave(state, player, &outcome);
    }
}

/// Public view of a game.
pub async fn game_info(state: &SharedState, game_id: &str) -> Result<GameInfo, ServiceError> {
    let shared = state.registry().game(game_id)?;
    let game = shared.lock().await;
    Ok(game.snapshot().into())
}

/// Recently finished games, newest first, capped at `limit` when given.
pub fn recent_games(state: &SharedState, limit: Option<usize>) -> GameHistoryResponse {
    let limit = limit.unwrap_or_else(|| state.config().history_size());
    GameHistoryResponse {
        games: state
            .history()
            .recent(limit)
            .into_iter()
            .map(Into::into)
            .collect(),
    }
}

async fn leave_current_game(state: &SharedState, player: &str) {
    if state.registry().game_of(player).is_some() {
        if let Err(err) = leave_game(state, player).await {
            debug!(player = %player, error = %err, "nothing to leave");
        }
    }
}

fn after_leave(state: &SharedState, player: &str, outcome: &LeaveOutcome) {
    info!(
        game_id = %outcome.game_id,
        player = %player,
        deleted = outcome.deleted,
        "player left game"
    );
    if outcome.deleted {
        state.scheduler().cancel(&outcome.game_id);
    } else {
        game_events::broadcast_player_left(state, &outcome.game_id, player);
    }
}

fn resolve_game_id(
    state: &SharedState,
    player: &str,
    game_id: Option<&str>,
) -> Result<GameId, ServiceError> {
    match game_id {
        Some(id) => Ok(id.to_string()),
        None => state
            .registry()
            .game_of(player)
            .ok_or(ServiceError::NotInGame),
    }
}

fn resolve_digit_count(state: &SharedState, requested: Option<usize>) -> Result<usize, ServiceError> {
    let config = state.config();
    config.digit_count(requested).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "digit count must be between 1 and {}",
            config.max_digit_count()
        ))
    })
}

fn scored_guess(notices: Vec<GameNotice>) -> Option<(Vec<u8>, GuessOutcome)> {
    notices.into_iter().find_map(|notice| match notice {
        GameNotice::GuessScored { guess, outcome, .. } => Some((guess, outcome)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::extract::ws::Message;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::game::DifficultyDto,
        state::{AppState, PlayerConnection, state_machine::GameError},
    };

    const TEST_DELAY: Duration = Duration::from_millis(20);

    fn test_state() -> SharedState {
        state_with(AppConfig::default())
    }

    fn state_with(config: AppConfig) -> SharedState {
        AppState::new(config.with_agent_delay(TEST_DELAY))
    }

    fn connect(state: &SharedState, player: &str) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        state.connect(PlayerConnection {
            id: player.to_string(),
            tx,
        });
        rx
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let Message::Text(text) = message {
                frames.push(serde_json::from_str(text.as_str()).unwrap());
            }
        }
        frames
    }

    fn event_names(frames: &[serde_json::Value]) -> Vec<String> {
        frames
            .iter()
            .map(|frame| frame["event"].as_str().unwrap().to_string())
            .collect()
    }

    async fn secret_of(state: &SharedState, game_id: &str) -> Vec<u8> {
        let shared = state.registry().game(game_id).unwrap();
        let game = shared.lock().await;
        game.peek_secret().unwrap().to_vec()
    }

    #[tokio::test]
    async fn start_agent_game_registers_and_announces() {
        let state = test_state();
        let mut rx = connect(&state, "alice");

        let started = start_agent_game(&state, "alice", None, None).await.unwrap();

        assert!(started.game_id.starts_with("ai_game_"));
        assert_eq!(started.info.digit_count, 3);
        assert!(started.info.is_ai_game);
        assert_eq!(started.info.current_player.as_deref(), Some("alice"));
        assert_eq!(state.registry().game_of("alice"), Some(started.game_id.clone()));
        assert_eq!(event_names(&drain(&mut rx)), vec!["aiGameStarted"]);
    }

    #[tokio::test]
    async fn start_rejects_out_of_range_digit_count() {
        let state = test_state();
        let err = start_agent_game(&state, "alice", Some(11), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(state.registry().game_count(), 0);
    }

    #[tokio::test]
    async fn starting_again_replaces_the_previous_game() {
        let state = test_state();
        let first = start_agent_game(&state, "alice", None, None).await.unwrap();
        let second = start_agent_game(&state, "alice", Some(4), None).await.unwrap();

        assert_ne!(first.game_id, second.game_id);
        assert!(state.registry().game(&first.game_id).is_err());
        assert_eq!(state.registry().game_count(), 1);
    }

    #[tokio::test]
    async fn agent_plays_after_the_delay_and_returns_the_turn() {
        let state = test_state();
        let mut rx = connect(&state, "alice");
        let started = start_agent_game(&state, "alice", Some(6), None).await.unwrap();
        let secret = secret_of(&state, &started.game_id).await;

        // A guess that is certainly wrong: the secret reversed.
        let mut miss = secret.clone();
        miss.reverse();
        let reply = make_guess(&state, "alice", None, miss, AgentTurns::Scheduled)
            .await
            .unwrap();
        assert!(!reply.result.game_over);
        assert_eq!(reply.info.current_player.as_deref(), Some(AGENT_ID));
        assert!(state.scheduler().is_pending(&started.game_id));

        let err = make_guess(&state, "alice", None, vec![0, 1, 2, 3, 4, 5], AgentTurns::Scheduled)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::NotYourTurn)));

        tokio::time::sleep(TEST_DELAY * 5).await;

        let info = game_info(&state, &started.game_id).await.unwrap();
        assert_eq!(info.guess_history.len(), 2);
        assert_eq!(info.guess_history[1].player_id, AGENT_ID);
        if info.winner.is_none() {
            assert_eq!(info.current_player.as_deref(), Some("alice"));
        }
        assert!(!state.scheduler().is_pending(&started.game_id));

        let names = event_names(&drain(&mut rx));
        assert_eq!(names[..3], ["aiGameStarted", "guessResult", "aiGuess"]);
    }

    #[tokio::test]
    async fn request_response_guesses_keep_the_turn() {
        let state = test_state();
        let started = start_agent_game(&state, "bob", None, None).await.unwrap();
        let secret = secret_of(&state, &started.game_id).await;
        let mut miss = secret.clone();
        miss.rotate_left(1);

        let reply = make_guess(
            &state,
            "bob",
            Some(&started.game_id),
            miss.clone(),
            AgentTurns::Disabled,
        )
        .await
        .unwrap();
        assert_eq!(reply.result.strikes, 0);
        assert_eq!(reply.result.balls, 3);
        assert_eq!(reply.info.current_player.as_deref(), Some("bob"));
        assert!(!state.scheduler().is_pending(&started.game_id));

        let reply = make_guess(
            &state,
            "bob",
            Some(&started.game_id),
            secret,
            AgentTurns::Disabled,
        )
        .await
        .unwrap();
        assert!(reply.result.game_over);
        assert_eq!(reply.result.winner.as_deref(), Some("bob"));
        assert_eq!(reply.info.round, 2);
    }

    #[tokio::test]
    async fn guess_on_unknown_game_is_not_found() {
        let state = test_state();
        let err = make_guess(
            &state,
            "bob",
            Some("ai_game_missing"),
            vec![1, 2, 3],
            AgentTurns::Disabled,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::GameNotFound(_)));

        let err = make_guess(&state, "bob", None, vec![1, 2, 3], AgentTurns::Scheduled)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotInGame));
    }

    #[tokio::test]
    async fn leaving_cancels_the_pending_agent_move() {
        let state = test_state();
        let started = start_agent_game(&state, "alice", Some(6), None).await.unwrap();
        let secret = secret_of(&state, &started.game_id).await;
        let mut miss = secret;
        miss.reverse();
        make_guess(&state, "alice", None, miss, AgentTurns::Scheduled)
            .await
            .unwrap();
        assert!(state.scheduler().is_pending(&started.game_id));

        let outcome = leave_game(&state, "alice").await.unwrap();
        assert!(outcome.deleted);
        assert!(!state.scheduler().is_pending(&started.game_id));
        assert_eq!(state.registry().game_count(), 0);

        tokio::time::sleep(TEST_DELAY * 3).await;
        assert_eq!(state.registry().game_count(), 0);
    }

    #[tokio::test]
    async fn agent_turn_on_missing_game_is_a_no_op() {
        let state = test_state();
        run_agent_turn(&state, "ai_game_gone").await;
        assert_eq!(state.registry().game_count(), 0);
    }

    #[tokio::test]
    async fn two_player_game_flow() {
        let state = test_state();
        let mut defender_rx = connect(&state, "dana");
        let mut attacker_rx = connect(&state, "eve");

        let created = create_two_player_game(&state, "dana", Some(3)).await.unwrap();
        assert!(created.game_id.starts_with("game_"));
        assert!(!created.info.secret_chosen);

        let info = join_game(&state, "eve", &created.game_id).await.unwrap();
        assert_eq!(info.attacker.as_deref(), Some("eve"));
        assert_eq!(info.current_player.as_deref(), Some("eve"));

        let err = make_guess(&state, "eve", None, vec![1, 2, 3], AgentTurns::Scheduled)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::AwaitingSecret)));

        let err = set_secret(&state, "eve", vec![4, 5, 6]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::NotDefender)));

        set_secret(&state, "dana", vec![4, 5, 6]).await.unwrap();
        let reply = make_guess(&state, "eve", None, vec![4, 5, 6], AgentTurns::Scheduled)
            .await
            .unwrap();
        assert!(reply.result.game_over);
        assert_eq!(reply.result.winner.as_deref(), Some("eve"));
        assert!(!state.scheduler().is_pending(&created.game_id));

        let defender_frames = drain(&mut defender_rx);
        assert_eq!(
            event_names(&defender_frames),
            vec!["gameCreated", "playerJoined", "secretSet", "guessResult", "gameOver"]
        );
        let game_over = defender_frames.last().unwrap();
        assert_eq!(game_over["data"]["secretNumber"], serde_json::json!([4, 5, 6]));
        assert_eq!(game_over["data"]["winner"], "eve");

        let attacker_frames = drain(&mut attacker_rx);
        assert_eq!(
            event_names(&attacker_frames),
            vec!["playerJoined", "secretSet", "guessResult", "gameOver"]
        );
    }

    #[tokio::test]
    async fn joining_is_refused_for_own_or_full_games() {
        let state = test_state();
        let created = create_two_player_game(&state, "dana", None).await.unwrap();

        let err = join_game(&state, "dana", &created.game_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        join_game(&state, "eve", &created.game_id).await.unwrap();
        let err = join_game(&state, "frank", &created.game_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::SeatTaken)));

        let err = join_game(&state, "frank", "game_missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::GameNotFound(_)));
    }

    #[tokio::test]
    async fn disconnect_notifies_the_remaining_player() {
        let state = test_state();
        let mut defender_rx = connect(&state, "dana");
        let _attacker_rx = connect(&state, "eve");
        let created = create_two_player_game(&state, "dana", None).await.unwrap();
        join_game(&state, "eve", &created.game_id).await.unwrap();
        drain(&mut defender_rx);

        disconnect(&state, "eve").await;

        assert!(state.connections().get("eve").is_none());
        assert_eq!(state.registry().game_count(), 1);
        let frames = drain(&mut defender_rx);
        assert_eq!(event_names(&frames), vec!["playerLeft"]);
        assert_eq!(frames[0]["data"]["playerId"], "eve");

        disconnect(&state, "dana").await;
        assert_eq!(state.registry().game_count(), 0);
    }

    #[tokio::test]
    async fn defender_cannot_guess_before_or_after_choosing_the_secret() {
        let state = test_state();
        let created = create_two_player_game(&state, "dana", Some(3)).await.unwrap();
        assert_eq!(created.info.current_player, None);

        let err = make_guess(&state, "dana", None, vec![4, 5, 6], AgentTurns::Scheduled)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::NotYourTurn)));

        set_secret(&state, "dana", vec![4, 5, 6]).await.unwrap();
        let err = make_guess(&state, "dana", None, vec![4, 5, 6], AgentTurns::Scheduled)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::NotYourTurn)));

        let err = make_guess(
            &state,
            "dana",
            Some(&created.game_id),
            vec![4, 5, 6],
            AgentTurns::Disabled,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::NotYourTurn)));

        let info = game_info(&state, &created.game_id).await.unwrap();
        assert!(info.guess_history.is_empty());
        assert_eq!(info.winner, None);
    }

    #[tokio::test]
    async fn refused_join_keeps_the_current_game() {
        let state = test_state();
        let created = create_two_player_game(&state, "dana", None).await.unwrap();
        join_game(&state, "eve", &created.game_id).await.unwrap();
        let own = start_agent_game(&state, "frank", None, None).await.unwrap();

        let err = join_game(&state, "frank", &created.game_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::SeatTaken)));

        assert!(state.registry().game(&own.game_id).is_ok());
        assert_eq!(state.registry().game_of("frank"), Some(own.game_id.clone()));
        let info = game_info(&state, &own.game_id).await.unwrap();
        assert_eq!(info.attacker.as_deref(), Some("frank"));
    }

    #[tokio::test]
    async fn accepted_join_leaves_the_previous_game() {
        let state = test_state();
        let created = create_two_player_game(&state, "dana", None).await.unwrap();
        let own = start_agent_game(&state, "eve", None, None).await.unwrap();

        join_game(&state, "eve", &created.game_id).await.unwrap();
        assert!(state.registry().game(&own.game_id).is_err());
        assert_eq!(state.registry().game_of("eve"), Some(created.game_id.clone()));
    }

    #[tokio::test]
    async fn agent_guess_that_ends_the_game_reveals_the_secret() {
        let state = state_with(AppConfig::default().with_max_rounds(2));
        let mut rx = connect(&state, "alice");
        let started = start_agent_game(&state, "alice", Some(6), None).await.unwrap();
        let secret = secret_of(&state, &started.game_id).await;

        let mut miss = secret.clone();
        miss.reverse();
        let reply = make_guess(&state, "alice", None, miss, AgentTurns::Scheduled)
            .await
            .unwrap();
        assert!(!reply.result.game_over);
        assert!(state.scheduler().is_pending(&started.game_id));

        tokio::time::sleep(TEST_DELAY * 5).await;

        let frames = drain(&mut rx);
        assert_eq!(
            event_names(&frames),
            vec!["aiGameStarted", "guessResult", "aiGuess", "gameOver"]
        );
        let agent_result = &frames[2]["data"]["result"];
        assert_eq!(agent_result["gameOver"], true);
        let solved = agent_result["strikes"] == 6;
        assert_eq!(agent_result["timedOut"], !solved);
        assert_eq!(agent_result["winner"], AGENT_ID);

        let game_over = &frames[3]["data"];
        assert_eq!(game_over["secretNumber"], serde_json::json!(secret));
        assert_eq!(game_over["winner"], AGENT_ID);
        assert_eq!(game_over["gameInfo"]["gameState"], "finished");

        assert!(!state.scheduler().is_pending(&started.game_id));
        let recorded = state.history().recent(1);
        assert_eq!(recorded[0].game_id, started.game_id);
        assert_eq!(recorded[0].secret, secret);
    }

    #[tokio::test]
    async fn finished_games_are_listed_newest_first() {
        let state = test_state();
        let mut finished_ids = Vec::new();
        for player in ["p1", "p2"] {
            let started = start_agent_game(&state, player, None, None).await.unwrap();
            let secret = secret_of(&state, &started.game_id).await;
            make_guess(&state, player, None, secret, AgentTurns::Disabled)
                .await
                .unwrap();
            finished_ids.push(started.game_id);
        }
        start_agent_game(&state, "p3", None, None).await.unwrap();

        let recent: Vec<_> = state
            .history()
            .recent(10)
            .into_iter()
            .map(|entry| entry.game_id)
            .collect();
        finished_ids.reverse();
        assert_eq!(recent, finished_ids);
    }

    #[tokio::test]
    async fn difficulty_shapes_the_secret_and_is_reported() {
        let state = test_state();
        let started = start_agent_game(&state, "alice", Some(4), Some(Difficulty::Easy))
            .await
            .unwrap();
        assert_eq!(started.info.difficulty, Some(DifficultyDto::Easy));

        let secret = secret_of(&state, &started.game_id).await;
        assert!(secret.windows(2).all(|pair| pair[1] == pair[0] + 1), "{secret:?}");
    }

    #[tokio::test]
    async fn restart_is_only_for_the_agent_game_attacker() {
        let state = test_state();
        let created = create_two_player_game(&state, "dana", None).await.unwrap();
        let err = restart_game(&state, "dana", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(state.registry().game(&created.game_id).is_ok());

        let started = start_agent_game(&state, "alice", Some(5), Some(Difficulty::Hard))
            .await
            .unwrap();
        let err = restart_game(&state, "mallory", Some(&started.game_id))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let restarted = restart_game(&state, "alice", None).await.unwrap();
        assert_ne!(restarted.game_id, started.game_id);
        assert_eq!(restarted.info.digit_count, 5);
        assert_eq!(restarted.info.difficulty, Some(DifficultyDto::Hard));
        assert!(state.registry().game(&started.game_id).is_err());
    }
}
