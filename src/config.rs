//! Application-level configuration loading: game rules, session retention and admin access.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};

use crate::state::scoring::{GameRules, TimeBonus};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "WHAT_A_SONG_CONFIG_PATH";
/// Environment variable that overrides the configured admin token.
const ADMIN_TOKEN_ENV: &str = "WHAT_A_SONG_ADMIN_TOKEN";
/// Idle time after which a live session is discarded.
const DEFAULT_SESSION_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    rules: GameRules,
    session_retention: Duration,
    admin_token: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        max_tries = config.rules.max_tries,
                        "loaded game rules from config"
                    );
                    config
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
        };

        match env::var(ADMIN_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => config.with_admin_token(token),
            _ => config,
        }
    }

    /// Parse a JSON configuration document. Missing keys take their default value.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Replace the admin token.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Replace the game rules.
    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Idle time after which a live session is discarded.
    pub fn session_retention(&self) -> Duration {
        self.session_retention
    }

    /// Token expected in the `x-admin-token` header. Admin routes are closed when unset.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rules: GameRules::default(),
            session_retention: DEFAULT_SESSION_RETENTION,
            admin_token: None,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    rules: RawRules,
    #[serde_as(as = "DurationSeconds<u64>")]
    session_retention_secs: Duration,
    admin_token: Option<String>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            rules: RawRules::default(),
            session_retention_secs: DEFAULT_SESSION_RETENTION,
            admin_token: None,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            rules: value.rules.into(),
            session_retention: value.session_retention_secs,
            admin_token: value.admin_token.filter(|token| !token.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the `rules` section.
struct RawRules {
    max_tries: u32,
    win_bonus: u32,
    per_try_bonus: u32,
    hint_baseline: u32,
    per_hint_bonus: u32,
    line_baseline: u32,
    per_line_bonus: u32,
    time_bonuses: Vec<RawTimeBonus>,
}

impl Default for RawRules {
    fn default() -> Self {
        let rules = GameRules::default();
        Self {
            max_tries: rules.max_tries,
            win_bonus: rules.win_bonus,
            per_try_bonus: rules.per_try_bonus,
            hint_baseline: rules.hint_baseline,
            per_hint_bonus: rules.per_hint_bonus,
            line_baseline: rules.line_baseline,
            per_line_bonus: rules.per_line_bonus,
            time_bonuses: rules
                .time_bonuses
                .into_iter()
                .map(|tier| RawTimeBonus {
                    within_secs: tier.within_secs,
                    bonus: tier.bonus,
                })
                .collect(),
        }
    }
}

impl From<RawRules> for GameRules {
    fn from(value: RawRules) -> Self {
        let mut time_bonuses = value
            .time_bonuses
            .into_iter()
            .map(|tier| TimeBonus {
                within_secs: tier.within_secs,
                bonus: tier.bonus,
            })
            .collect::<Vec<_>>();
        time_bonuses.sort_by_key(|tier| tier.within_secs);

        Self {
            max_tries: value.max_tries.max(1),
            win_bonus: value.win_bonus,
            per_try_bonus: value.per_try_bonus,
            hint_baseline: value.hint_baseline,
            per_hint_bonus: value.per_hint_bonus,
            line_baseline: value.line_baseline,
            per_line_bonus: value.per_line_bonus,
            time_bonuses,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single time bonus tier.
struct RawTimeBonus {
    within_secs: u64,
    bonus: u32,
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
