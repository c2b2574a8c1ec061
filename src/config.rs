//! Application-level configuration loading: turn timing and scoring knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{services::coordinator::MatchSettings, state::round_tracker::DEFAULT_REGULATION_ROUNDS};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PENALTY_SHOOTOUT_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    turn_timeout_secs: u64,
    regulation_rounds: u32,
    rematch_prompt_delay_secs: u64,
    winner_points: i64,
    identification_timeout_secs: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        turn_timeout_secs = app_config.turn_timeout_secs,
                        regulation_rounds = app_config.regulation_rounds,
                        "loaded match settings from config"
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

    /// Parse a JSON document; absent keys keep their default value.
    pub fn from_json_str(contents: &str) -> serde_json::Result<Self> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        Ok(raw.into())
    }

    /// Settings handed to every new match coordinator.
    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            turn_timeout: Duration::from_secs(self.turn_timeout_secs),
            regulation_rounds: self.regulation_rounds,
            rematch_prompt_delay: Duration::from_secs(self.rematch_prompt_delay_secs),
            winner_points: self.winner_points,
        }
    }

    /// How long a fresh socket may stay silent before identifying itself.
    pub fn identification_timeout(&self) -> Duration {
        Duration::from_secs(self.identification_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    turn_timeout_secs: u64,
    regulation_rounds: u32,
    rematch_prompt_delay_secs: u64,
    winner_points: i64,
    identification_timeout_secs: u64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: 15,
            regulation_rounds: DEFAULT_REGULATION_ROUNDS,
            rematch_prompt_delay_secs: 3,
            winner_points: 3,
            identification_timeout_secs: 10,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        // A zero-length turn would auto-pick before anyone could act.
        let turn_timeout_secs = if value.turn_timeout_secs == 0 {
            warn!("turn_timeout_secs must be positive; using 1");
            1
        } else {
            value.turn_timeout_secs
        };
        // Regulation needs an even count so both players shoot equally often.
        let regulation_rounds = if value.regulation_rounds == 0 || value.regulation_rounds % 2 != 0 {
            warn!(
                regulation_rounds = value.regulation_rounds,
                "regulation_rounds must be a positive even number; using default"
            );
            DEFAULT_REGULATION_ROUNDS
        } else {
            value.regulation_rounds
        };
        Self {
            turn_timeout_secs,
            regulation_rounds,
            rematch_prompt_delay_secs: value.rematch_prompt_delay_secs,
            winner_points: value.winner_points,
            identification_timeout_secs: value.identification_timeout_secs,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let settings = AppConfig::default().match_settings();
        assert_eq!(settings, MatchSettings::default());
        assert_eq!(
            AppConfig::default().identification_timeout(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let config = AppConfig::from_json_str(r#"{"turn_timeout_secs": 5, "winner_points": 1}"#)
            .unwrap();
        let settings = config.match_settings();
        assert_eq!(settings.turn_timeout, Duration::from_secs(5));
        assert_eq!(settings.winner_points, 1);
        assert_eq!(settings.regulation_rounds, DEFAULT_REGULATION_ROUNDS);
    }

    #[test]
    fn odd_regulation_falls_back_to_default() {
        let config = AppConfig::from_json_str(r#"{"regulation_rounds": 7}"#).unwrap();
        assert_eq!(config.match_settings().regulation_rounds, DEFAULT_REGULATION_ROUNDS);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AppConfig::from_json_str("{").is_err());
    }
}
