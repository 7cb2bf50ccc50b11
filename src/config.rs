//! Application-level configuration loading: default game rules and the optional admin token.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{
    lineup::{DEFAULT_STARTERS_REQUIRED, LineupRules},
    live_game::{DEFAULT_PERIOD_LENGTH, DEFAULT_PERIODS_PER_GAME, GameRules},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TOUCHLINE_CONFIG_PATH";

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    rules: GameRules,
    admin_token: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        starters_required = app_config.rules.lineup.starters_required,
                        periods_per_game = app_config.rules.periods_per_game,
                        admin_token = app_config.admin_token.is_some(),
                        "loaded configuration"
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

    /// Rules applied to newly created games unless the request overrides them.
    pub fn default_rules(&self) -> GameRules {
        self.rules
    }

    /// Token mutating routes must carry in `X-Admin-Token`, when configured.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    lineup: RawLineup,
    #[serde(default)]
    clock: RawClock,
    #[serde(default)]
    admin_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLineup {
    starters_required: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawClock {
    period_length_seconds: Option<u64>,
    periods_per_game: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let starters_required = positive(
            "lineup.starters_required",
            value.lineup.starters_required,
            DEFAULT_STARTERS_REQUIRED,
        );
        let period_length = positive(
            "clock.period_length_seconds",
            value.clock.period_length_seconds,
            DEFAULT_PERIOD_LENGTH.as_secs(),
        );
        let periods_per_game = positive(
            "clock.periods_per_game",
            value.clock.periods_per_game,
            DEFAULT_PERIODS_PER_GAME,
        );

        Self {
            rules: GameRules {
                lineup: LineupRules { starters_required },
                period_length: Duration::from_secs(period_length),
                periods_per_game,
            },
            admin_token: value
                .admin_token
                .map(|token| token.trim().to_owned())
                .filter(|token| !token.is_empty()),
        }
    }
}

/// Keep a configured value only when it is non-zero.
fn positive<T>(key: &str, value: Option<T>, default: T) -> T
where
    T: Copy + Default + PartialEq + std::fmt::Display,
{
    match value {
        Some(v) if v == T::default() => {
            warn!(key, default = %default, "config value must be positive; using default");
            default
        }
        Some(v) => v,
        None => default,
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
