use std::time::SystemTime;

use thiserror::Error;

use crate::state::{
    difficulty::Difficulty,
    digits::{self, DigitsError, MAX_DIGIT_COUNT, Score},
};

/// Opaque identifier of a participant (a connection id or the scripted agent).
pub type PlayerId = String;

/// Identifier used for the scripted opponent in agent games.
pub const AGENT_ID: &str = "agent";

/// Who the initiator plays against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Human attacker against the scripted agent, which holds the secret.
    Agent,
    /// Human defender holding the secret, human attacker guessing it.
    TwoPlayer,
}

/// Lifecycle of a game. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Created but not started yet.
    Waiting,
    /// Guesses are accepted.
    Playing,
    /// Someone won or the round budget ran out.
    Finished,
}

/// Events that can be applied to a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Start the game on behalf of `initiator`.
    ///
    /// Agent games require the generated secret here. Two-player games may
    /// carry the defender's secret up front or receive it later through
    /// [`GameEvent::SetSecret`].
    Start {
        /// Player opening the game.
        initiator: PlayerId,
        /// Secret to guess, if already known.
        secret: Option<Vec<u8>>,
    },
    /// Seat a second human as attacker in a two-player game.
    AddOpponent {
        /// Player taking the attacker seat.
        joiner: PlayerId,
    },
    /// Defender chooses the secret of a two-player game.
    SetSecret {
        /// Player submitting the secret.
        player: PlayerId,
        /// Chosen digits.
        secret: Vec<u8>,
    },
    /// Submit a guess against the secret.
    Guess {
        /// Player guessing.
        player: PlayerId,
        /// Guessed digits.
        guess: Vec<u8>,
    },
    /// Hand the turn over to another seated player.
    PassTurn {
        /// Player who must guess next.
        player: PlayerId,
    },
}

/// One accepted guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessRecord {
    /// Who guessed.
    pub player: PlayerId,
    /// The guessed digits.
    pub guess: Vec<u8>,
    /// Strike/ball feedback.
    pub score: Score,
    /// Round the guess was made in.
    pub round: u32,
}

/// Result of an accepted guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    /// Strike/ball feedback.
    pub score: Score,
    /// Round the guess was made in.
    pub round: u32,
    /// Whether this guess ended the game.
    pub game_over: bool,
    /// Whether the game ended because the round budget ran out.
    pub timed_out: bool,
    /// Winner, when the game ended.
    pub winner: Option<PlayerId>,
}

/// Facts produced by an applied transition, consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameNotice {
    /// The game entered `Playing`.
    Started {
        /// Mode the game runs in.
        mode: GameMode,
    },
    /// An attacker took the free seat.
    OpponentJoined {
        /// The new attacker.
        attacker: PlayerId,
    },
    /// The defender chose the secret.
    SecretSet,
    /// A guess was scored.
    GuessScored {
        /// Who guessed.
        player: PlayerId,
        /// The guessed digits.
        guess: Vec<u8>,
        /// Scoring result.
        outcome: GuessOutcome,
    },
    /// The turn moved to another player.
    TurnPassed {
        /// Player now expected to guess.
        player: PlayerId,
    },
    /// The game reached `Finished`.
    Finished {
        /// Winner, if any seat was still occupied.
        winner: Option<PlayerId>,
        /// Whether the round budget ran out.
        timed_out: bool,
    },
}

/// Reasons an event is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The event is not allowed in the current phase.
    #[error("game is not in progress ({phase:?})")]
    InvalidState {
        /// Phase the game was in.
        phase: GamePhase,
    },
    /// Someone else must guess now.
    #[error("not your turn")]
    NotYourTurn,
    /// Guess or secret length differs from the game's digit count.
    #[error("expected {expected} digits (got {actual})")]
    WrongLength {
        /// Digit count of the game.
        expected: usize,
        /// Submitted length.
        actual: usize,
    },
    /// A digit appears more than once.
    #[error("digits must not repeat")]
    DuplicateDigits,
    /// A value outside `0..=9` was submitted.
    #[error("digit {0} is outside 0-9")]
    InvalidDigit(u8),
    /// The defender of a two-player game has not chosen the secret yet.
    #[error("waiting for the defender to choose a secret")]
    AwaitingSecret,
    /// The attacker seat is already occupied (or does not exist).
    #[error("opponent seat is not available")]
    SeatTaken,
    /// The defender tried to join their own game.
    #[error("cannot join your own game")]
    OwnGame,
    /// Only the defender may choose the secret.
    #[error("only the defender can choose the secret")]
    NotDefender,
    /// The secret is immutable once chosen.
    #[error("secret has already been chosen")]
    SecretAlreadySet,
    /// The referenced player holds no seat in this game.
    #[error("`{0}` is not seated in this game")]
    NotAPlayer(PlayerId),
    /// The game changed between planning and applying a transition.
    #[error("stale transition (planned against version {expected}, game is at {actual})")]
    StaleTransition {
        /// Version the plan was computed against.
        expected: u64,
        /// Current version.
        actual: u64,
    },
}

/// A validated transition that has not been committed yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Event that produced this plan.
    pub event: GameEvent,
    /// Version the plan was computed from.
    pub version_from: u64,
    /// Notices emitted once the plan is applied.
    pub notices: Vec<GameNotice>,
    next: GameStateMachine,
}

impl Plan {
    /// Game state the plan would commit.
    pub fn next(&self) -> &GameStateMachine {
        &self.next
    }
}

/// Public view of a game. The secret is never part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Mode the game runs in.
    pub mode: GameMode,
    /// Length of the secret.
    pub digit_count: usize,
    /// Lifecycle phase.
    pub phase: GamePhase,
    /// Current round, starting at 1.
    pub round: u32,
    /// Round budget.
    pub max_rounds: u32,
    /// Rounds left before the defender wins by timeout.
    pub remaining_rounds: u32,
    /// Player expected to guess next.
    pub current_turn: Option<PlayerId>,
    /// Holder of the secret.
    pub defender: Option<PlayerId>,
    /// Guessing player.
    pub attacker: Option<PlayerId>,
    /// Accepted guesses in order.
    pub history: Vec<GuessRecord>,
    /// Winner once finished.
    pub winner: Option<PlayerId>,
    /// Whether the defender already chose a secret.
    pub secret_chosen: bool,
    /// Difficulty the agent plays at, when one was requested.
    pub difficulty: Option<Difficulty>,
    /// Creation time.
    pub created_at: SystemTime,
    /// Time the game reached `Finished`.
    pub finished_at: Option<SystemTime>,
    /// Number of applied transitions.
    pub version: u64,
}

/// State machine for a single game of number baseball.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    mode: GameMode,
    digit_count: usize,
    max_rounds: u32,
    phase: GamePhase,
    round: u32,
    current_turn: Option<PlayerId>,
    defender: Option<PlayerId>,
    attacker: Option<PlayerId>,
    secret: Option<Vec<u8>>,
    history: Vec<GuessRecord>,
    winner: Option<PlayerId>,
    difficulty: Option<Difficulty>,
    created_at: SystemTime,
    finished_at: Option<SystemTime>,
    version: u64,
}

impl GameStateMachine {
    /// Create a game waiting to be started.
    pub fn new(mode: GameMode, digit_count: usize, max_rounds: u32) -> Result<Self, DigitsError> {
        if digit_count == 0 || digit_count > MAX_DIGIT_COUNT {
            return Err(DigitsError::CountOutOfRange(digit_count));
        }

        Ok(Self {
            mode,
            digit_count,
            max_rounds,
            phase: GamePhase::Waiting,
            round: 1,
            current_turn: None,
            defender: None,
            attacker: None,
            secret: None,
            history: Vec::new(),
            winner: None,
            difficulty: None,
            created_at: SystemTime::now(),
            finished_at: None,
            version: 0,
        })
    }

    /// Attach the difficulty the agent plays at.
    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Difficulty the agent plays at, if any.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// Time the game finished, if it did.
    pub fn finished_at(&self) -> Option<SystemTime> {
        self.finished_at
    }

    /// Guesses accepted so far, oldest first.
    pub fn history(&self) -> &[GuessRecord] {
        &self.history
    }

    /// Mode the game runs in.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Length of the secret and of every guess.
    pub fn digit_count(&self) -> usize {
        self.digit_count
    }

    /// Player expected to guess next.
    pub fn current_turn(&self) -> Option<&str> {
        self.current_turn.as_deref()
    }

    /// Guessing player.
    pub fn attacker(&self) -> Option<&str> {
        self.attacker.as_deref()
    }

    /// Holder of the secret.
    pub fn defender(&self) -> Option<&str> {
        self.defender.as_deref()
    }

    /// Number of applied transitions.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether `player` occupies the attacker or defender seat.
    pub fn is_seated(&self, player: &str) -> bool {
        self.attacker.as_deref() == Some(player) || self.defender.as_deref() == Some(player)
    }

    /// Secret, revealed only once the game is finished.
    pub fn reveal_secret(&self) -> Option<&[u8]> {
        match self.phase {
            GamePhase::Finished => self.secret.as_deref(),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn peek_secret(&self) -> Option<&[u8]> {
        self.secret.as_deref()
    }

    /// Create a snapshot of every public field.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            mode: self.mode,
            digit_count: self.digit_count,
            phase: self.phase,
            round: self.round,
            max_rounds: self.max_rounds,
            remaining_rounds: if self.round > self.max_rounds {
                0
            } else {
                self.max_rounds - self.round + 1
            },
            current_turn: self.current_turn.clone(),
            defender: self.defender.clone(),
            attacker: self.attacker.clone(),
            history: self.history.clone(),
            winner: self.winner.clone(),
            secret_chosen: self.secret.is_some(),
            difficulty: self.difficulty,
            created_at: self.created_at,
            finished_at: self.finished_at,
            version: self.version,
        }
    }

    /// Validate an event against the current state without touching it.
    pub fn plan(&self, event: GameEvent) -> Result<Plan, GameError> {
        let mut next = self.clone();
        let notices = next.step(&event)?;
        next.version = self.version + 1;

        Ok(Plan {
            event,
            version_from: self.version,
            notices,
            next,
        })
    }

    /// Commit a plan computed by [`GameStateMachine::plan`], returning its notices.
    pub fn apply(&mut self, plan: Plan) -> Result<Vec<GameNotice>, GameError> {
        if plan.version_from != self.version {
            return Err(GameError::StaleTransition {
                expected: plan.version_from,
                actual: self.version,
            });
        }

        *self = plan.next;
        Ok(plan.notices)
    }

    /// Plan and apply an event in one go.
    pub fn handle(&mut self, event: GameEvent) -> Result<Vec<GameNotice>, GameError> {
        let plan = self.plan(event)?;
        self.apply(plan)
    }

    /// Free every seat held by `player`, returning whether the game has no seated players left.
    ///
    /// The agent never leaves on its own, so it is unseated together with the
    /// last human of an agent game.
    pub fn vacate(&mut self, player: &str) -> bool {
        if self.attacker.as_deref() == Some(player) {
            self.attacker = None;
        }
        if self.defender.as_deref() == Some(player) {
            self.defender = None;
        }
        if self.mode == GameMode::Agent && self.attacker.is_none() {
            self.defender = None;
        }

        self.attacker.is_none() && self.defender.is_none()
    }

    fn step(&mut self, event: &GameEvent) -> Result<Vec<GameNotice>, GameError> {
        match event {
            GameEvent::Start { initiator, secret } => self.start(initiator, secret.as_deref()),
            GameEvent::AddOpponent { joiner } => self.add_opponent(joiner),
            GameEvent::SetSecret { player, secret } => self.set_secret(player, secret),
            GameEvent::Guess { player, guess } => self.submit_guess(player, guess),
            GameEvent::PassTurn { player } => self.pass_turn(player),
        }
    }

    fn start(
        &mut self,
        initiator: &PlayerId,
        secret: Option<&[u8]>,
    ) -> Result<Vec<GameNotice>, GameError> {
        self.require_phase(GamePhase::Waiting)?;
        if let Some(secret) = secret {
            self.check_digits(secret)?;
        }

        match self.mode {
            GameMode::Agent => {
                let secret = secret.ok_or(GameError::AwaitingSecret)?;
                self.attacker = Some(initiator.clone());
                self.defender = Some(AGENT_ID.to_string());
                self.secret = Some(secret.to_vec());
                self.current_turn = Some(initiator.clone());
            }
            GameMode::TwoPlayer => {
                // Nobody guesses until an attacker joins.
                self.defender = Some(initiator.clone());
                self.attacker = None;
                self.secret = secret.map(<[u8]>::to_vec);
                self.current_turn = None;
            }
        }

        self.phase = GamePhase::Playing;
        Ok(vec![GameNotice::Started { mode: self.mode }])
    }

    fn add_opponent(&mut self, joiner: &PlayerId) -> Result<Vec<GameNotice>, GameError> {
        self.require_phase(GamePhase::Playing)?;
        if self.mode != GameMode::TwoPlayer || self.attacker.is_some() || self.defender.is_none() {
            return Err(GameError::SeatTaken);
        }
        if self.defender.as_ref() == Some(joiner) {
            return Err(GameError::OwnGame);
        }

        self.attacker = Some(joiner.clone());
        self.current_turn = Some(joiner.clone());
        Ok(vec![GameNotice::OpponentJoined {
            attacker: joiner.clone(),
        }])
    }

    fn set_secret(
        &mut self,
        player: &PlayerId,
        secret: &[u8],
    ) -> Result<Vec<GameNotice>, GameError> {
        self.require_phase(GamePhase::Playing)?;
        if self.defender.as_ref() != Some(player) {
            return Err(GameError::NotDefender);
        }
        if self.secret.is_some() {
            return Err(GameError::SecretAlreadySet);
        }
        self.check_digits(secret)?;

        self.secret = Some(secret.to_vec());
        Ok(vec![GameNotice::SecretSet])
    }

    fn submit_guess(
        &mut self,
        player: &PlayerId,
        guess: &[u8],
    ) -> Result<Vec<GameNotice>, GameError> {
        self.require_phase(GamePhase::Playing)?;
        if self.mode == GameMode::TwoPlayer && self.attacker.as_ref() != Some(player) {
            return Err(GameError::NotYourTurn);
        }
        if self.current_turn.as_ref() != Some(player) {
            return Err(GameError::NotYourTurn);
        }
        self.check_digits(guess)?;
        let secret = self.secret.as_deref().ok_or(GameError::AwaitingSecret)?;

        let score = digits::evaluate(secret, guess);
        let round = self.round;
        self.history.push(GuessRecord {
            player: player.clone(),
            guess: guess.to_vec(),
            score,
            round,
        });

        let (game_over, timed_out) = if score.strikes == self.digit_count {
            self.finish(Some(player.clone()));
            (true, false)
        } else {
            self.round = self.round.saturating_add(1);
            if self.round > self.max_rounds {
                self.finish(self.defender.clone());
                (true, true)
            } else {
                (false, false)
            }
        };

        let outcome = GuessOutcome {
            score,
            round,
            game_over,
            timed_out,
            winner: self.winner.clone(),
        };
        let mut notices = vec![GameNotice::GuessScored {
            player: player.clone(),
            guess: guess.to_vec(),
            outcome,
        }];
        if game_over {
            notices.push(GameNotice::Finished {
                winner: self.winner.clone(),
                timed_out,
            });
        }
        Ok(notices)
    }

    fn pass_turn(&mut self, player: &PlayerId) -> Result<Vec<GameNotice>, GameError> {
        self.require_phase(GamePhase::Playing)?;
        if !self.is_seated(player) {
            return Err(GameError::NotAPlayer(player.clone()));
        }

        self.current_turn = Some(player.clone());
        Ok(vec![GameNotice::TurnPassed {
            player: player.clone(),
        }])
    }

    fn finish(&mut self, winner: Option<PlayerId>) {
        self.phase = GamePhase::Finished;
        self.winner = winner;
        self.finished_at = Some(SystemTime::now());
    }

    fn require_phase(&self, expected: GamePhase) -> Result<(), GameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::InvalidState { phase: self.phase })
        }
    }

    /// Length, range, then uniqueness.
    fn check_digits(&self, candidate: &[u8]) -> Result<(), GameError> {
        if candidate.len() != self.digit_count {
            return Err(GameError::WrongLength {
                expected: self.digit_count,
                actual: candidate.len(),
            });
        }
        if let Some(digit) = digits::first_invalid_digit(candidate) {
            return Err(GameError::InvalidDigit(digit));
        }
        if digits::has_duplicates(candidate) {
            return Err(GameError::DuplicateDigits);
        }
        Ok(())
    }
}
