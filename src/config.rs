//! Application-level configuration loading: game rules, agent pacing and static assets.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::digits::MAX_DIGIT_COUNT;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BASEBALL_BACK_CONFIG_PATH";

const DEFAULT_DIGIT_COUNT: usize = 3;
const DEFAULT_MAX_ROUNDS: u32 = 20;
const DEFAULT_AGENT_DELAY_MS: u64 = 1_000;
const DEFAULT_STATIC_DIR: &str = "public";
const DEFAULT_HISTORY_SIZE: usize = 20;
const DEFAULT_FINISHED_GAME_TTL_SECS: u64 = 600;
const DEFAULT_REAP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    default_digit_count: usize,
    max_digit_count: usize,
    max_rounds: u32,
    agent_delay: Duration,
    static_dir: PathBuf,
    history_size: usize,
    finished_game_ttl: Duration,
    reap_interval: Duration,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        max_rounds = app_config.max_rounds,
                        agent_delay_ms = app_config.agent_delay.as_millis() as u64,
                        "loaded game configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Digit count used when a client does not ask for one.
    pub fn default_digit_count(&self) -> usize {
        self.default_digit_count
    }

    /// Largest digit count a client may request.
    pub fn max_digit_count(&self) -> usize {
        self.max_digit_count
    }

    /// Round budget of every game.
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Pause before the scripted agent plays its move.
    pub fn agent_delay(&self) -> Duration {
        self.agent_delay
    }

    /// Directory served for non-API requests.
    pub fn static_dir(&self) -> &PathBuf {
        &self.static_dir
    }

    /// Number of finished games kept for the history listing.
    pub fn history_size(&self) -> usize {
        self.history_size
    }

    /// How long a finished game stays reachable before it is reclaimed.
    pub fn finished_game_ttl(&self) -> Duration {
        self.finished_game_ttl
    }

    /// Pause between two sweeps for reclaimable games.
    pub fn reap_interval(&self) -> Duration {
        self.reap_interval
    }

    /// Resolve a requested digit count, returning `None` when it is out of bounds.
    pub fn digit_count(&self, requested: Option<usize>) -> Option<usize> {
        let count = requested.unwrap_or(self.default_digit_count);
        (1..=self.max_digit_count).contains(&count).then_some(count)
    }

    #[cfg(test)]
    pub(crate) fn with_agent_delay(mut self, delay: Duration) -> Self {
        self.agent_delay = delay;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_finished_game_ttl(mut self, ttl: Duration) -> Self {
        self.finished_game_ttl = ttl;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_digit_count: DEFAULT_DIGIT_COUNT,
            max_digit_count: MAX_DIGIT_COUNT,
            max_rounds: DEFAULT_MAX_ROUNDS,
            agent_delay: Duration::from_millis(DEFAULT_AGENT_DELAY_MS),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            history_size: DEFAULT_HISTORY_SIZE,
            finished_game_ttl: Duration::from_secs(DEFAULT_FINISHED_GAME_TTL_SECS),
            reap_interval: Duration::from_secs(DEFAULT_REAP_INTERVAL_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    default_digit_count: Option<usize>,
    #[serde(default)]
    max_digit_count: Option<usize>,
    #[serde(default)]
    max_rounds: Option<u32>,
    #[serde(default)]
    agent_delay_ms: Option<u64>,
    #[serde(default)]
    static_dir: Option<PathBuf>,
    #[serde(default)]
    history_size: Option<usize>,
    #[serde(default)]
    finished_game_ttl_secs: Option<u64>,
    #[serde(default)]
    reap_interval_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();

        let max_digit_count = match value.max_digit_count {
            Some(count) if (1..=MAX_DIGIT_COUNT).contains(&count) => count,
            Some(count) => {
                warn!(count, "max_digit_count out of range; using {MAX_DIGIT_COUNT}");
                MAX_DIGIT_COUNT
            }
            None => defaults.max_digit_count,
        };
        let default_digit_count = match value.default_digit_count {
            Some(count) if (1..=max_digit_count).contains(&count) => count,
            Some(count) => {
                warn!(count, "default_digit_count out of range; using {DEFAULT_DIGIT_COUNT}");
                DEFAULT_DIGIT_COUNT.min(max_digit_count)
            }
            None => defaults.default_digit_count.min(max_digit_count),
        };
        let max_rounds = match value.max_rounds {
            Some(0) => {
                warn!("max_rounds must be positive; using {DEFAULT_MAX_ROUNDS}");
                DEFAULT_MAX_ROUNDS
            }
            Some(rounds) => rounds,
            None => defaults.max_rounds,
        };
        let reap_interval = match value.reap_interval_secs {
            Some(0) => {
                warn!("reap_interval_secs must be positive; using {DEFAULT_REAP_INTERVAL_SECS}");
                defaults.reap_interval
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.reap_interval,
        };

        Self {
            default_digit_count,
            max_digit_count,
            max_rounds,
            agent_delay: value
                .agent_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.agent_delay),
            static_dir: value.static_dir.unwrap_or(defaults.static_dir),
            history_size: value.history_size.unwrap_or(defaults.history_size),
            finished_game_ttl: value
                .finished_game_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.finished_game_ttl),
            reap_interval,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
