//! Bounded in-memory log of recently finished games.

use std::{collections::VecDeque, time::SystemTime};

use parking_lot::Mutex;

use crate::state::{
    registry::GameId,
    state_machine::{GamePhase, GameSnapshot, GameStateMachine},
};

/// A game captured at the moment it finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedGame {
    /// Identifier the game had while live.
    pub game_id: GameId,
    /// Final public state.
    pub snapshot: GameSnapshot,
    /// Revealed secret.
    pub secret: Vec<u8>,
    /// When the game reached `Finished`.
    pub finished_at: SystemTime,
}

impl FinishedGame {
    /// Capture `game` if it is finished.
    pub fn capture(game_id: &str, game: &GameStateMachine) -> Option<Self> {
        if game.phase() != GamePhase::Finished {
            return None;
        }

        Some(Self {
            game_id: game_id.to_string(),
            snapshot: game.snapshot(),
            secret: game.reveal_secret()?.to_vec(),
            finished_at: game.finished_at()?,
        })
    }
}

/// Newest-first list of finished games, capped at a fixed capacity.
#[derive(Debug)]
pub struct GameHistory {
    capacity: usize,
    entries: Mutex<VecDeque<FinishedGame>>,
}

impl GameHistory {
    /// Keep at most `capacity` games; zero disables the history.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Record a finished game, evicting the oldest one when full.
    pub fn record(&self, game: FinishedGame) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.lock();
        entries.retain(|entry| entry.game_id != game.game_id);
        entries.push_front(game);
        entries.truncate(self.capacity);
    }

    /// Up to `limit` finished games, newest first.
    pub fn recent(&self, limit: usize) -> Vec<FinishedGame> {
        self.entries.lock().iter().take(limit).cloned().collect()
    }

    /// Number of games currently kept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
