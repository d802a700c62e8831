//! Configuration file parsing (JSON format).

use std::fs;
use std::path::Path;

use tracing::{debug, error};

use crate::common::error::ConfigError;
use crate::config::types::BridgeConfig;

/// Load configuration from a JSON file, creating a default one if missing.
///
/// A freshly created file holds placeholder credentials, so the returned
/// config fails validation until the operator edits it.
pub fn load_or_create_config(path: impl AsRef<Path>) -> Result<BridgeConfig, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        let config = BridgeConfig::default();
        let json = serde_json::to_string_pretty(&config).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        debug!("Config file created: {}", path.display());
        error!("Please update the config file with your bot token and channel ID.");
        return Ok(config);
    }

    load_config(path)
}

/// Load configuration from an existing JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<BridgeConfig, ConfigError> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    load_config_str(&content)
}

/// Load configuration from a JSON string.
pub fn load_config_str(content: &str) -> Result<BridgeConfig, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}
