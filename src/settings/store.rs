use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::settings::types::BoothConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MEMORY_BOOTH_CONFIG";
/// Config file used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "memory-booth.json";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The config path from the environment, or the default file name.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Where a loaded config came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

/// Load and validate the config, returning defaults on a missing file.
pub fn load(path: &Path) -> Result<BoothConfig> {
    load_with_source(path).map(|(config, _)| config)
}

/// Like [`load`], also reporting whether the file existed.
///
/// Callers that install logging from the loaded config use the source to
/// report the outcome once a subscriber is in place.
pub fn load_with_source(path: &Path) -> Result<(BoothConfig, ConfigSource)> {
    if !path.exists() {
        return Ok((BoothConfig::default(), ConfigSource::Defaults));
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: BoothConfig =
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    validate(&config)?;
    Ok((config, ConfigSource::File))
}

pub fn validate(config: &BoothConfig) -> Result<()> {
    config.layout.validate().map_err(ConfigError::Invalid)?;
    if config.timing.countdown_from == 0 {
        return Err(ConfigError::Invalid(
            "countdown_from must be at least 1".to_string(),
        ));
    }
    Ok(())
}
