//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `CORDBRIDGE_BOT_TOKEN` - Discord bot token
//! - `CORDBRIDGE_CHANNEL_ID` - Target Discord channel id
//!
//! The standalone runner additionally reads:
//! - `CORDBRIDGE_CONFIG` - Config file path
//! - `CORDBRIDGE_SERVER_NAME` - Display name of the local server
//! - `CORDBRIDGE_MAX_PLAYERS` - Player capacity of the local server

use std::env;

use tracing::warn;

use crate::config::types::BridgeConfig;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "CORDBRIDGE";

const DEFAULT_SERVER_NAME: &str = "Local Server";
const DEFAULT_MAX_PLAYERS: usize = 16;

/// Apply environment variable overrides to a config.
///
/// This allows the token to be provided via the environment
/// instead of the config file.
pub fn apply_env_overrides(mut config: BridgeConfig) -> BridgeConfig {
    if let Ok(token) = env::var(format!("{}_BOT_TOKEN", ENV_PREFIX)) {
        config.credential = token;
    }

    if let Ok(channel_id) = env::var(format!("{}_CHANNEL_ID", ENV_PREFIX)) {
        match channel_id.parse() {
            Ok(id) => config.target_channel_id = id,
            Err(e) => warn!("Ignoring {}_CHANNEL_ID '{}': {}", ENV_PREFIX, channel_id, e),
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `CORDBRIDGE_CONFIG` environment variable, otherwise returns "cordbridge.json".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "cordbridge.json".to_string())
}

/// Display name for the local server.
pub fn get_server_name() -> String {
    env::var(format!("{}_SERVER_NAME", ENV_PREFIX))
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string())
}

/// Player capacity of the local server.
pub fn get_max_players() -> usize {
    env::var(format!("{}_MAX_PLAYERS", ENV_PREFIX))
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_MAX_PLAYERS)
}
