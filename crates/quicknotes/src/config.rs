//! Configuration management for quicknotes.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "quicknotes";

/// Default cache database file name.
const DATABASE_FILE_NAME: &str = "notes.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "QUICKNOTES_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `QUICKNOTES_`, sections split on `__`,
///    e.g. `QUICKNOTES_REMOTE__BASE_URL`)
/// 2. TOML config file at `~/.config/quicknotes/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session configuration.
    pub session: SessionConfig,
    /// Remote collection configuration.
    pub remote: RemoteConfig,
    /// Local cache configuration.
    pub cache: CacheConfig,
    /// Synchronization policy.
    pub sync: SyncConfig,
    /// Summarizer configuration.
    pub summarizer: SummarizerConfig,
}

/// Who the notes belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Stable user identifier notes are stored under.
    pub user_id: String,
}

/// Which remote collection to synchronize with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteBackend {
    /// No remote collection; notes live in the local cache only.
    #[default]
    None,
    /// The HTTP CRUD facade.
    Http,
}

/// Remote collection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Backend to use.
    pub backend: RemoteBackend,
    /// Base URL of the HTTP facade.
    pub base_url: String,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Local cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Keep a local `SQLite` copy of the notes.
    pub enabled: bool,
    /// Path to the cache database.
    /// Defaults to `~/.local/share/quicknotes/notes.db`
    pub database_path: Option<PathBuf>,
}

/// How a server-assigned id relates to the id a note was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// The client-generated id is sent to the remote and kept forever.
    #[default]
    ClientIdPermanent,
    /// The remote assigns the id; the optimistic note is re-keyed to it.
    ServerIdWins,
}

/// Synchronization settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Identity reconciliation policy.
    pub id_policy: IdPolicy,
}

/// Summarizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// URL of the generation proxy.
    pub endpoint: String,
    /// Title used when the generated summary has none.
    pub default_title: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend: RemoteBackend::None,
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: None, // Resolved to the data dir at runtime
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/generate".to_string(),
            default_title: "AI Summary".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        if self.session.user_id.trim().is_empty() {
            return Err(invalid("session.user_id must not be empty"));
        }

        if self.remote.timeout_ms == 0 {
            return Err(invalid("remote.timeout_ms must be greater than 0"));
        }

        if self.remote.backend == RemoteBackend::Http && !is_http_url(&self.remote.base_url) {
            return Err(invalid(format!(
                "remote.base_url must start with http:// or https://, got `{}`",
                self.remote.base_url
            )));
        }

        if !is_http_url(&self.summarizer.endpoint) {
            return Err(invalid(format!(
                "summarizer.endpoint must start with http:// or https://, got `{}`",
                self.summarizer.endpoint
            )));
        }

        if self.summarizer.default_title.trim().is_empty() {
            return Err(invalid("summarizer.default_title must not be empty"));
        }

        if self.summarizer.timeout_ms == 0 {
            return Err(invalid("summarizer.timeout_ms must be greater than 0"));
        }

        Ok(())
    }

    /// Get the cache database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.cache
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the remote call timeout as a Duration.
    #[must_use]
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.timeout_ms)
    }

    /// Get the summarizer timeout as a Duration.
    #[must_use]
    pub fn summarizer_timeout(&self) -> Duration {
        Duration::from_millis(self.summarizer.timeout_ms)
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
