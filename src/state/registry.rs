use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::state::state_machine::{GameMode, GameStateMachine, PlayerId};

/// Opaque identifier of a game, generated at creation.
pub type GameId = String;

/// A game guarded by its own lock; mutations on one game never block another.
pub type SharedGame = Arc<Mutex<GameStateMachine>>;

/// Per-connection bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEntry {
    /// Game the player currently belongs to.
    pub game_id: Option<GameId>,
}

/// Lookup failures in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No game with this identifier exists.
    #[error("game `{0}` not found")]
    GameNotFound(GameId),
    /// The player is not bound to any game.
    #[error("you are not in a game")]
    NotInGame,
}

/// What happened to a game when a player left it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Game that was left.
    pub game_id: GameId,
    /// Whether the game was removed because no seat remained occupied.
    pub deleted: bool,
}

/// Owns every game and maps players to the game they are in.
#[derive(Default)]
pub struct Registry {
    games: DashMap<GameId, SharedGame>,
    sessions: DashMap<PlayerId, SessionEntry>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `player` with no game attached.
    pub fn connect(&self, player: &str) {
        self.sessions.entry(player.to_string()).or_default();
    }

    /// Take ownership of a started game and bind `owner` to it.
    pub fn create_game(&self, owner: &str, game: GameStateMachine) -> (GameId, SharedGame) {
        let prefix = match game.mode() {
            GameMode::Agent => "ai_game",
            GameMode::TwoPlayer => "game",
        };
        let game_id = format!("{prefix}_{}", Uuid::new_v4().simple());
        let shared = Arc::new(Mutex::new(game));

        self.games.insert(game_id.clone(), shared.clone());
        self.bind(owner, &game_id);
        (game_id, shared)
    }

    /// Look a game up by identifier.
    pub fn game(&self, game_id: &str) -> Result<SharedGame, RegistryError> {
        self.games
            .get(game_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::GameNotFound(game_id.to_string()))
    }

    /// Game the player is currently bound to.
    pub fn game_of(&self, player: &str) -> Option<GameId> {
        self.sessions
            .get(player)
            .and_then(|entry| entry.game_id.clone())
    }

    /// Bind `player` to `game_id`, creating the session if needed.
    pub fn bind(&self, player: &str, game_id: &str) {
        self.sessions.entry(player.to_string()).or_default().game_id = Some(game_id.to_string());
    }

    /// Detach `player` from its game, returning the game it was bound to.
    pub fn unbind(&self, player: &str) -> Option<GameId> {
        self.sessions
            .get_mut(player)
            .and_then(|mut entry| entry.game_id.take())
    }

    /// Players whose session points at `game_id`.
    pub fn members(&self, game_id: &str) -> Vec<PlayerId> {
        self.sessions
            .iter()
            .filter(|entry| entry.game_id.as_deref() == Some(game_id))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Remove `player` from its game, deleting the game once both seats are empty.
    pub async fn leave_game(&self, player: &str) -> Result<LeaveOutcome, RegistryError> {
        let game_id = self.unbind(player).ok_or(RegistryError::NotInGame)?;
        let Some(game) = self.games.get(&game_id).map(|entry| entry.value().clone()) else {
            return Ok(LeaveOutcome {
                game_id,
                deleted: true,
            });
        };

        let empty = game.lock().await.vacate(player);
        if empty {
            self.games.remove(&game_id);
        }

        Ok(LeaveOutcome {
            game_id,
            deleted: empty,
        })
    }

    /// Drop the session of `player`, leaving its game first.
    pub async fn disconnect(&self, player: &str) -> Option<LeaveOutcome> {
        let outcome = self.leave_game(player).await.ok();
        self.sessions.remove(player);
        outcome
    }

    /// Every live game, for sweeps that must not hold the map while locking games.
    pub fn games(&self) -> Vec<(GameId, SharedGame)> {
        self.games
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Drop a game and detach every player bound to it, returning those players.
    pub fn remove_game(&self, game_id: &str) -> Vec<PlayerId> {
        self.games.remove(game_id);
        let members = self.members(game_id);
        for player in &members {
            if let Some(mut entry) = self.sessions.get_mut(player) {
                if entry.game_id.as_deref() == Some(game_id) {
                    entry.game_id = None;
                }
            }
        }
        members
    }

    /// Forget sessions that are bound to no game and fail `keep`, returning how many went.
    pub fn prune_idle_sessions<F>(&self, keep: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let before = self.sessions.len();
        self.sessions
            .retain(|player, entry| entry.game_id.is_some() || keep(player.as_str()));
        before.saturating_sub(self.sessions.len())
    }

    /// Number of live games.
    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Number of known sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_machine::GameEvent;

    fn started(mode: GameMode, initiator: &str) -> GameStateMachine {
        let mut game = GameStateMachine::new(mode, 3, 20).unwrap();
        game.handle(GameEvent::Start {
            initiator: initiator.into(),
            secret: Some(vec![1, 2, 3]),
        })
        .unwrap();
        game
    }

    #[test]
    fn create_game_binds_owner() {
        let registry = Registry::new();
        registry.connect("alice");
        let (game_id, _) = registry.create_game("alice", started(GameMode::Agent, "alice"));

        assert!(game_id.starts_with("ai_game_"));
        assert_eq!(registry.game_of("alice"), Some(game_id.clone()));
        assert_eq!(registry.members(&game_id), vec!["alice".to_string()]);
        assert!(registry.game(&game_id).is_ok());
        assert_eq!(registry.game_count(), 1);
    }

    #[test]
    fn unknown_game_is_reported() {
        let registry = Registry::new();
        assert_eq!(
            registry.game("missing").unwrap_err(),
            RegistryError::GameNotFound("missing".into())
        );
    }

    #[tokio::test]
    async fn leaving_agent_game_deletes_it() {
        let registry = Registry::new();
        let (game_id, _) = registry.create_game("alice", started(GameMode::Agent, "alice"));

        let outcome = registry.leave_game("alice").await.unwrap();
        assert_eq!(
            outcome,
            LeaveOutcome {
                game_id: game_id.clone(),
                deleted: true
            }
        );
        assert!(registry.game(&game_id).is_err());
        assert_eq!(registry.game_of("alice"), None);
    }

    #[tokio::test]
    async fn two_player_game_survives_until_both_leave() {
        let registry = Registry::new();
        let (game_id, game) = registry.create_game("dana", started(GameMode::TwoPlayer, "dana"));
        game.lock()
            .await
            .handle(GameEvent::AddOpponent {
                joiner: "eve".into(),
            })
            .unwrap();
        registry.bind("eve", &game_id);

        let mut members = registry.members(&game_id);
        members.sort();
        assert_eq!(members, vec!["dana".to_string(), "eve".to_string()]);

        assert!(!registry.leave_game("dana").await.unwrap().deleted);
        assert!(registry.game(&game_id).is_ok());
        assert!(registry.disconnect("eve").await.unwrap().deleted);
        assert!(registry.game(&game_id).is_err());
        assert_eq!(registry.session_count(), 1);
    }

    #[test]
    fn removing_a_game_detaches_its_members() {
        let registry = Registry::new();
        let (game_id, _) = registry.create_game("alice", started(GameMode::Agent, "alice"));
        let (other_id, _) = registry.create_game("bob", started(GameMode::Agent, "bob"));

        assert_eq!(registry.remove_game(&game_id), vec!["alice".to_string()]);
        assert!(registry.game(&game_id).is_err());
        assert_eq!(registry.game_of("alice"), None);
        assert_eq!(registry.game_of("bob"), Some(other_id));
        assert_eq!(registry.session_count(), 2);
    }

    #[test]
    fn pruning_keeps_bound_and_kept_sessions() {
        let registry = Registry::new();
        registry.connect("socket");
        registry.connect("idle");
        registry.create_game("busy", started(GameMode::Agent, "busy"));

        assert_eq!(registry.prune_idle_sessions(|player| player == "socket"), 1);
        assert_eq!(registry.session_count(), 2);
        assert_eq!(registry.games().len(), 1);
    }

    #[tokio::test]
    async fn leaving_without_game_fails() {
        let registry = Registry::new();
        registry.connect("bob");
        assert_eq!(
            registry.leave_game("bob").await.unwrap_err(),
            RegistryError::NotInGame
        );
        assert_eq!(registry.disconnect("bob").await, None);
        assert_eq!(registry.session_count(), 0);
    }
}
