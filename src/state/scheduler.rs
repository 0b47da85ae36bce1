use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use tokio::{task::AbortHandle, time::sleep};
use tracing::debug;

use crate::state::registry::GameId;

struct ScheduledMove {
    ticket: u64,
    handle: AbortHandle,
}

/// Delayed agent moves, at most one per game, cancellable by game identifier.
pub struct AgentScheduler {
    delay: Duration,
    tasks: Arc<DashMap<GameId, ScheduledMove>>,
    tickets: AtomicU64,
}

impl AgentScheduler {
    /// Build a scheduler that waits `delay` before running each move.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            tasks: Arc::new(DashMap::new()),
            tickets: AtomicU64::new(0),
        }
    }

    /// Delay applied before every move.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `work` after the configured delay, replacing any move already queued for `game_id`.
    ///
    /// `work` may still find the game gone or finished when it fires and must
    /// check before mutating.
    pub fn schedule<F>(&self, game_id: GameId, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay;
        let tasks = self.tasks.clone();
        let key = game_id.clone();

        let handle = tokio::spawn(async move {
            sleep(delay).await;
            work.await;
            tasks.remove_if(&key, |_, scheduled| scheduled.ticket == ticket);
        })
        .abort_handle();

        if let Some(previous) = self
            .tasks
            .insert(game_id.clone(), ScheduledMove { ticket, handle })
        {
            debug!(game_id = %game_id, "replacing pending agent move");
            previous.handle.abort();
        }
    }

    /// Abort the pending move of `game_id`, returning whether one was queued.
    pub fn cancel(&self, game_id: &str) -> bool {
        match self.tasks.remove(game_id) {
            Some((_, scheduled)) => {
                scheduled.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Whether a move is still queued or running for `game_id`.
    pub fn is_pending(&self, game_id: &str) -> bool {
        self.tasks.contains_key(game_id)
    }
}
