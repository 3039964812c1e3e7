//! Configuration management for the busca CLI.
//!
//! Settings are layered, later sources winning:
//! 1. Default values
//! 2. Config file (`~/.busca/config.toml`)
//! 3. Environment variables (`OLLAMA_BASE_URL`, `OLLAMA_MODEL`)
//! 4. Command-line flags

mod schema;

pub use schema::{BuscaConfig, ConfigIssue, IssueLevel};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// Invalid value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".busca")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a specific path; a missing file yields defaults.
pub async fn load_config_from(path: &Path) -> ConfigResult<BuscaConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(BuscaConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: BuscaConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Load the file at `path` and apply environment overrides.
pub async fn load_effective(path: &Path) -> ConfigResult<BuscaConfig> {
    Ok(load_config_from(path).await?.with_env())
}

/// Save configuration to a specific path.
pub async fn save_config_to(config: &BuscaConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

/// Write the default configuration to `path`.
///
/// Returns `false` without touching the file if it exists and `force` is not set.
pub async fn init_config_at(path: &Path, force: bool) -> ConfigResult<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    save_config_to(&BuscaConfig::default(), path).await?;
    Ok(true)
}

/// Fail if `config` has any error-level issue.
pub fn ensure_valid(config: &BuscaConfig) -> ConfigResult<Vec<ConfigIssue>> {
    let issues = config.validate();
    let errors: Vec<String> = issues
        .iter()
        .filter(|issue| issue.level == IssueLevel::Error)
        .map(ToString::to_string)
        .collect();
    if errors.is_empty() {
        Ok(issues)
    } else {
        Err(ConfigError::InvalidValue(errors.join("; ")))
    }
}
