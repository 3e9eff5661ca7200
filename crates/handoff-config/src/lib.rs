//! Configuration for handoff
//!
//! Two sources:
//! - `UpdaterConfig.json`, written by the update distribution, naming the
//!   update server and optionally pinning a target version
//! - `handoff.toml`, the tool's own settings (product identity, settle
//!   interval, working directory)

mod schema;
mod settings;
mod store;
mod validation;

pub use schema::*;
pub use settings::*;
pub use store::*;
pub use validation::*;

pub use handoff_util::UPDATER_CONFIG_FILE;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    SettingsParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load an updater config from a JSON file
pub fn load_updater_config(path: impl AsRef<Path>) -> ConfigResult<UpdaterConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_updater_config(&content)
}

/// Parse an updater config from a JSON string
pub fn parse_updater_config(content: &str) -> ConfigResult<UpdaterConfig> {
    Ok(serde_json::from_str(content)?)
}

/// Load and validate settings from a TOML file
pub fn load_settings(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parse and validate settings from a TOML string
pub fn parse_settings(content: &str) -> ConfigResult<Settings> {
    let raw: RawSettings = toml::from_str(content)?;

    let errors = validate_settings(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}
