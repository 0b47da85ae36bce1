pub mod agent;
pub mod difficulty;
pub mod digits;
pub mod history;
pub mod registry;
pub mod scheduler;
pub mod state_machine;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;

use crate::{
    config::AppConfig,
    dto::ws::ServerEvent,
    services::websocket_service::send_message_to_websocket,
};

use self::{
    history::GameHistory, registry::Registry, scheduler::AgentScheduler, state_machine::PlayerId,
};

/// Application state shared across handlers and tasks.
pub type SharedState = Arc<AppState>;

#[derive(Clone)]
/// Handle used to push messages to a connected player.
pub struct PlayerConnection {
    /// Player the socket belongs to.
    pub id: PlayerId,
    /// Outbound frame queue drained by the socket writer.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state: configuration, game registry, live sockets, pending agent moves
/// and the log of finished games.
pub struct AppState {
    config: Arc<AppConfig>,
    registry: Registry,
    connections: DashMap<PlayerId, PlayerConnection>,
    scheduler: AgentScheduler,
    history: GameHistory,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        let scheduler = AgentScheduler::new(config.agent_delay());
        let history = GameHistory::new(config.history_size());
        Arc::new(Self {
            config: Arc::new(config),
            registry: Registry::new(),
            connections: DashMap::new(),
            scheduler,
            history,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Games and player sessions.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Pending agent moves keyed by game.
    pub fn scheduler(&self) -> &AgentScheduler {
        &self.scheduler
    }

    /// Recently finished games.
    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    /// Registry of live WebSocket connections keyed by player.
    pub fn connections(&self) -> &DashMap<PlayerId, PlayerConnection> {
        &self.connections
    }

    /// Register a live socket and open its session.
    pub fn connect(&self, connection: PlayerConnection) {
        self.registry.connect(&connection.id);
        self.connections.insert(connection.id.clone(), connection);
    }

    /// Push an event to one player, dropping the connection if its writer is gone.
    ///
    /// Players without a socket (request/response clients) are skipped.
    pub fn send_to_player(&self, player: &str, event: &ServerEvent) {
        let Some(connection) = self.connections.get(player) else {
            return;
        };

        let tx = connection.tx.clone();
        drop(connection);

        if send_message_to_websocket(&tx, event).is_err() {
            warn!(player = %player, "send failed (writer closed), removing connection");
            self.connections.remove(player);
        }
    }
}
