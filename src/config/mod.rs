//! Configuration management for boardsync.
//!
//! Configuration is read from `~/.config/boardsync/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::SyncError;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub repository: RepositoryConfig,
    pub endpoints: EndpointConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub listing: ListingConfig,
    pub storage: StorageConfig,
}

/// The repository whose discussion board is synchronized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Root of the REST API, e.g. `https://api.github.com`
    pub rest_base: String,
    /// Single endpoint of the structured-query (GraphQL) API
    pub graphql_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            rest_base: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-attempt timeout in milliseconds (default: 10000)
    pub timeout_ms: u64,
    /// Retries after the first attempt for transient failures (default: 3)
    pub max_retries: u32,
    /// Base retry delay; attempt `n` waits `retry_delay_ms * (n + 1)` (default: 1000)
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            user_agent: concat!("boardsync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of cached discussion listings in seconds (default: 300)
    pub discussions_ttl_secs: u64,
    /// Lifetime of cached comment threads in seconds (default: 180)
    pub comments_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            discussions_ttl_secs: 300,
            comments_ttl_secs: 180,
        }
    }
}

impl CacheConfig {
    pub fn discussions_ttl(&self) -> Duration {
        Duration::from_secs(self.discussions_ttl_secs)
    }

    pub fn comments_ttl(&self) -> Duration {
        Duration::from_secs(self.comments_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: u32,
    pub default_category: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            default_category: "all".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Session database path (default: `<data dir>/boardsync/session.db`)
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/boardsync/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("boardsync").join("config.toml"))
    }

    /// Check everything the services need before any of them is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.owner.trim().is_empty() {
            return Err(ConfigError::Invalid("repository.owner must be set".into()));
        }
        if self.repository.name.trim().is_empty() {
            return Err(ConfigError::Invalid("repository.name must be set".into()));
        }

        for (field, value) in [
            ("endpoints.rest_base", &self.endpoints.rest_base),
            ("endpoints.graphql_url", &self.endpoints.graphql_url),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| ConfigError::Invalid(format!("{field} '{value}': {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!(
                    "{field} '{value}' must use http or https"
                )));
            }
        }

        if self.http.timeout_ms == 0 {
            return Err(ConfigError::Invalid("http.timeout_ms must be positive".into()));
        }
        if self.listing.page_size == 0 || self.listing.page_size > 100 {
            return Err(ConfigError::Invalid(
                "listing.page_size must be between 1 and 100".into(),
            ));
        }

        Ok(())
    }

    /// Base URL of the repository's REST resources, without trailing slash.
    pub fn repository_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.endpoints.rest_base.trim_end_matches('/'),
            self.repository.owner,
            self.repository.name
        )
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# boardsync configuration
#
# The discussion board lives in the repository below. Both the
# structured-query endpoint and the REST API must point at the same host.

[repository]
owner = ""
name = ""

[endpoints]
rest_base = "https://api.github.com"
graphql_url = "https://api.github.com/graphql"

[http]
# Per-attempt timeout in milliseconds
timeout_ms = 10000

# Transient failures (timeouts, transport errors, 5xx) are retried.
# Attempt n waits retry_delay_ms * (n + 1) before retrying.
max_retries = 3
retry_delay_ms = 1000

[cache]
discussions_ttl_secs = 300
comments_ttl_secs = 180

[listing]
page_size = 20
default_category = "all"

[storage]
# Session database; defaults to the platform data directory
# path = "/home/me/.local/share/boardsync/session.db"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for SyncError {
    fn from(err: ConfigError) -> Self {
        SyncError::Config(err.to_string())
    }
}
