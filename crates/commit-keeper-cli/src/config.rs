//! # Configuration
//!
//! Typed configuration for the `commit-keeper` binary.
//!
//! Sources are applied in order, later sources overriding earlier ones:
//!  1. `/etc/commit-keeper/config.yaml`: system-wide defaults
//!  2. `./config/commit-keeper.yaml`: deployment-local override
//!  3. the file given with `--config` (or `COMMIT_KEEPER_CONFIG`)
//!  4. environment variables prefixed `CK__` with a double-underscore
//!     separator, e.g. `CK__SINK__KIND=file` sets `sink.kind`
//!
//! Every field has a serde default, so an unconfigured environment yields a
//! valid configuration. A malformed file or a value that cannot be coerced
//! is a hard error.

use commit_keeper_core::ProviderUrl;
use commit_keeper_github::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CK";

const SYSTEM_CONFIG: &str = "/etc/commit-keeper/config";
const LOCAL_CONFIG: &str = "config/commit-keeper";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ============================================================================
// Configuration Types
// ============================================================================

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeeperConfig {
    pub github: GitHubConfig,
    pub sink: SinkConfig,
    pub logging: LoggingConfig,
}

/// GitHub API client settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API base URL; derived from each event's provider URL when unset
    pub api_url: Option<String>,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            api_url: None,
            timeout_seconds: client.timeout.as_secs(),
            user_agent: client.user_agent,
        }
    }
}

impl GitHubConfig {
    /// Client configuration for [`commit_keeper_github::GitHubClient`]
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::default()
            .with_user_agent(&self.user_agent)
            .with_timeout(Duration::from_secs(self.timeout_seconds));

        match &self.api_url {
            Some(url) => config.with_github_api_url(url),
            None => config,
        }
    }
}

/// Where entity batches are written
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    /// Output file, required when `kind` is `file`
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// One JSON line per batch on standard output
    #[default]
    Stdout,
    /// One JSON line per batch appended to `path`
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

// ============================================================================
// Validation
// ============================================================================

impl KeeperConfig {
    /// Validate configuration
    ///
    /// Checks that:
    /// - the GitHub API URL, when set, is an absolute http(s) URL
    /// - the request timeout is non-zero and the user agent is not blank
    /// - a file sink has a path
    /// - the log level is one of `trace`, `debug`, `info`, `warn`, `error`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.github.api_url {
            ProviderUrl::new(url.as_str()).map_err(|e| ConfigError::Invalid {
                key: "github.api_url".to_string(),
                message: e.to_string(),
            })?;
        }

        if self.github.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "github.timeout_seconds".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.github.user_agent.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "github.user_agent".to_string(),
            });
        }

        if self.sink.kind == SinkKind::File && self.sink.path.is_none() {
            return Err(ConfigError::Missing {
                key: "sink.path".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid {
                key: "logging.level".to_string(),
                message: format!(
                    "'{}' is not one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load and validate configuration from all sources
///
/// # Errors
///
/// Returns `ConfigError` if an explicit file is missing, any source is
/// malformed, or the merged configuration fails validation.
pub fn load_configuration(explicit_path: Option<&Path>) -> Result<KeeperConfig, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(
            config::File::with_name(SYSTEM_CONFIG)
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name(LOCAL_CONFIG)
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        info!(path = %path.display(), "Loading configuration from explicit path");
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let config: KeeperConfig = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
