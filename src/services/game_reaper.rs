use std::time::SystemTime;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::state::SharedState;

/// What a sweep reclaimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// Finished games removed from the registry.
    pub games: usize,
    /// Sessions dropped because they had neither a game nor a socket.
    pub sessions: usize,
}

/// Periodically reclaim finished games and orphaned sessions.
///
/// Request/response clients never disconnect, so without this their games and
/// sessions would live as long as the process.
pub async fn run(state: SharedState) {
    let interval = state.config().reap_interval();
    info!(
        interval_secs = interval.as_secs(),
        ttl_secs = state.config().finished_game_ttl().as_secs(),
        "game reaper started"
    );

    loop {
        sleep(interval).await;
        let report = reclaim_finished(&state, SystemTime::now()).await;
        if report != ReapReport::default() {
            info!(
                games = report.games,
                sessions = report.sessions,
                "reclaimed finished games"
            );
        }
    }
}

/// Remove every game that finished at least `finished_game_ttl` before `now`, then
/// forget sessions left without a game or a live connection.
pub async fn reclaim_finished(state: &SharedState, now: SystemTime) -> ReapReport {
    let ttl = state.config().finished_game_ttl();
    let mut report = ReapReport::default();

    for (game_id, shared) in state.registry().games() {
        let finished_at = shared.lock().await.finished_at();
        let expired = finished_at.is_some_and(|finished_at| {
            now.duration_since(finished_at)
                .is_ok_and(|age| age >= ttl)
        });
        if !expired {
            continue;
        }

        let members = state.registry().remove_game(&game_id);
        state.scheduler().cancel(&game_id);
        debug!(game_id = %game_id, members = ?members, "finished game reclaimed");
        report.games += 1;
    }

    report.sessions = state
        .registry()
        .prune_idle_sessions(|player| state.connections().contains_key(player));
    report
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        config::AppConfig,
        services::game_service::{self, AgentTurns},
        state::{AppState, PlayerConnection},
    };

    async fn win(state: &SharedState, player: &str) -> String {
        let started = game_service::start_agent_game(state, player, Some(1), None)
            .await
            .unwrap();
        for digit in 0..10 {
            let reply =
                game_service::make_guess(state, player, None, vec![digit], AgentTurns::Disabled)
                    .await
                    .unwrap();
            if reply.result.game_over {
                break;
            }
        }
        started.game_id
    }

    #[tokio::test]
    async fn finished_games_past_the_ttl_are_reclaimed() {
        let state = AppState::new(AppConfig::default().with_finished_game_ttl(Duration::ZERO));
        let finished = win(&state, "http-client").await;
        let running = game_service::start_agent_game(&state, "other-client", None, None)
            .await
            .unwrap();

        let report = reclaim_finished(&state, SystemTime::now()).await;

        assert_eq!(
            report,
            ReapReport {
                games: 1,
                sessions: 1
            }
        );
        assert!(state.registry().game(&finished).is_err());
        assert!(state.registry().game(&running.game_id).is_ok());
        assert_eq!(state.registry().game_of("http-client"), None);
        assert_eq!(state.registry().session_count(), 1);
        assert_eq!(state.history().recent(1)[0].game_id, finished);
    }

    #[tokio::test]
    async fn recently_finished_games_are_kept() {
        let state = AppState::new(
            AppConfig::default().with_finished_game_ttl(Duration::from_secs(600)),
        );
        let finished = win(&state, "http-client").await;

        let report = reclaim_finished(&state, SystemTime::now()).await;

        assert_eq!(report, ReapReport::default());
        assert!(state.registry().game(&finished).is_ok());
    }

    #[tokio::test]
    async fn connected_players_keep_their_session() {
        let state = AppState::new(AppConfig::default().with_finished_game_ttl(Duration::ZERO));
        let (tx, _rx) = mpsc::unbounded_channel();
        state.connect(PlayerConnection {
            id: "socket".into(),
            tx,
        });
        let finished = win(&state, "socket").await;

        let report = reclaim_finished(&state, SystemTime::now()).await;

        assert_eq!(report.games, 1);
        assert_eq!(report.sessions, 0);
        assert!(state.registry().game(&finished).is_err());
        assert_eq!(state.registry().session_count(), 1);
    }
}
