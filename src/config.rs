//! Configuration management for Textly
//!
//! This module handles loading, parsing, and validating configuration
//! from YAML files with per-field defaults.

use crate::error::{Result, TextlyError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Textly
///
/// Holds everything the client needs: the backend server location and
/// credentials, chat behavior limits, quick-action trimming budgets, and
/// realtime reconnect timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat behavior settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Quick-action (assist) settings
    #[serde(default)]
    pub assist: AssistConfig,

    /// Realtime subscription settings
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

/// Backend server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the workspace backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Login identity (email) used for `textly auth`
    #[serde(default)]
    pub identity: Option<String>,

    /// Bearer token override
    ///
    /// When unset, the token is resolved from the `TEXTLY_TOKEN`
    /// environment variable and then the OS keyring.
    #[serde(default)]
    pub token: Option<String>,

    /// Connect timeout for backend requests (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            identity: None,
            token: None,
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

/// Chat behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum number of conversations kept in client state
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,

    /// Maximum number of quick-action suggestions kept in history
    #[serde(default = "default_max_history")]
    pub max_suggestion_history: usize,
}

fn default_max_conversations() -> usize {
    20
}

fn default_max_history() -> usize {
    10
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_conversations: default_max_conversations(),
            max_suggestion_history: default_max_history(),
        }
    }
}

/// Quick-action configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistConfig {
    /// Word budget on each side of the selection when trimming context
    #[serde(default = "default_max_context_words")]
    pub max_context_words: usize,
}

fn default_max_context_words() -> usize {
    100
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            max_context_words: default_max_context_words(),
        }
    }
}

/// Realtime subscription configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Fixed delay between reconnect attempts (seconds)
    #[serde(default = "default_retry_seconds")]
    pub retry_seconds: u64,
}

fn default_retry_seconds() -> u64 {
    5
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            retry_seconds: default_retry_seconds(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            chat: ChatConfig::default(),
            assist: AssistConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// A missing file is not an error: defaults are used so the client
    /// works out of the box against a local backend.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use textly::config::Config;
    ///
    /// let config = Config::load("does-not-exist.yaml").unwrap();
    /// assert_eq!(config.server.base_url, "http://localhost:8080");
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`TextlyError::Config`] if the base URL is not a valid
    /// absolute URL or any limit is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use textly::config::Config;
    ///
    /// let config = Config::default();
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.server.base_url).map_err(|e| {
            TextlyError::Config(format!(
                "invalid server.base_url '{}': {}",
                self.server.base_url, e
            ))
        })?;

        if self.chat.max_conversations == 0 {
            return Err(TextlyError::Config(
                "chat.max_conversations must be greater than zero".to_string(),
            )
            .into());
        }

        if self.assist.max_context_words == 0 {
            return Err(TextlyError::Config(
                "assist.max_context_words must be greater than zero".to_string(),
            )
            .into());
        }

        if self.realtime.retry_seconds == 0 {
            return Err(TextlyError::Config(
                "realtime.retry_seconds must be greater than zero".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.base_url, "http://localhost:8080");
        assert_eq!(config.chat.max_conversations, 20);
        assert_eq!(config.chat.max_suggestion_history, 10);
        assert_eq!(config.assist.max_context_words, 100);
        assert_eq!(config.realtime.retry_seconds, 5);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = Config::load("definitely/not/here.yaml").unwrap();
        assert_eq!(config.server.base_url, default_base_url());
    }

    #[test]
    fn test_load_parses_yaml() {
        let yaml = r#"
server:
  base_url: https://textly.example.com
  identity: user@example.com
chat:
  max_conversations: 5
assist:
  max_context_words: 50
realtime:
  retry_seconds: 2
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.base_url, "https://textly.example.com");
        assert_eq!(config.server.identity.as_deref(), Some("user@example.com"));
        assert_eq!(config.chat.max_conversations, 5);
        assert_eq!(config.chat.max_suggestion_history, 10);
        assert_eq!(config.assist.max_context_words, 50);
        assert_eq!(config.realtime.retry_seconds, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server:\n  base_url: http://127.0.0.1:9999\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.server.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.chat.max_conversations = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.assist.max_context_words = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.realtime.retry_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.server.base_url, config.server.base_url);
        assert_eq!(parsed.chat.max_conversations, config.chat.max_conversations);
    }
}
