//! Application-level configuration loading: application id, tracked music and sign-in tokens.

use std::{collections::HashMap, env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "REBMS_BACK_CONFIG_PATH";

/// Application id used to namespace every stored document.
pub const DEFAULT_APP_ID: &str = "default-app-id";
/// Track the leaderboard and demo scores refer to.
pub const DEFAULT_MUSIC_ID: &str = "MOCK_BMS_001";
/// Number of entries kept on the leaderboard.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Namespace of the stored documents.
    pub app_id: String,
    /// Track id used by the leaderboard.
    pub music_id: String,
    /// Maximum number of leaderboard entries returned.
    pub leaderboard_size: usize,
    /// Token tried first when signing in at startup.
    pub initial_auth_token: Option<String>,
    /// Token to user id table accepted by the local identity provider.
    pub auth_tokens: HashMap<String, String>,
    /// Whether the anonymous sign-in fallback is available.
    pub allow_anonymous: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        app_id = %app_config.app_id,
                        music_id = %app_config.music_id,
                        tokens = app_config.auth_tokens.len(),
                        "loaded application config"
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

    /// Parse a JSON configuration; omitted fields take their default.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.into(),
            music_id: DEFAULT_MUSIC_ID.into(),
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            initial_auth_token: None,
            auth_tokens: HashMap::new(),
            allow_anonymous: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    app_id: Option<String>,
    music_id: Option<String>,
    leaderboard_size: Option<usize>,
    initial_auth_token: Option<String>,
    auth_tokens: HashMap<String, String>,
    allow_anonymous: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            app_id: value
                .app_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or(defaults.app_id),
            music_id: value
                .music_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or(defaults.music_id),
            leaderboard_size: value
                .leaderboard_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.leaderboard_size),
            initial_auth_token: value.initial_auth_token.filter(|token| !token.is_empty()),
            auth_tokens: value.auth_tokens,
            allow_anonymous: value.allow_anonymous.unwrap_or(defaults.allow_anonymous),
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
    fn empty_document_yields_defaults() {
        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "app_id": "rebms",
                "leaderboard_size": 5,
                "initial_auth_token": "t-1",
                "auth_tokens": {"t-1": "player-one"},
                "allow_anonymous": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.app_id, "rebms");
        assert_eq!(config.music_id, DEFAULT_MUSIC_ID);
        assert_eq!(config.leaderboard_size, 5);
        assert_eq!(config.initial_auth_token.as_deref(), Some("t-1"));
        assert_eq!(config.auth_tokens["t-1"], "player-one");
        assert!(!config.allow_anonymous);
    }

    #[test]
    fn blank_values_fall_back() {
        let config =
            AppConfig::from_json(r#"{"app_id": " ", "leaderboard_size": 0, "initial_auth_token": ""}"#)
                .unwrap();
        assert_eq!(config.app_id, DEFAULT_APP_ID);
        assert_eq!(config.leaderboard_size, DEFAULT_LEADERBOARD_SIZE);
        assert_eq!(config.initial_auth_token, None);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json("[1, 2]").is_err());
    }
}
