//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::{BridgeConfig, PLACEHOLDER_CHANNEL_ID, PLACEHOLDER_TOKEN};

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &BridgeConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.credential.trim().is_empty() {
        errors.push("BotToken is required".to_string());
    }
    if config.credential == PLACEHOLDER_TOKEN {
        errors.push("BotToken has not been configured (still using placeholder)".to_string());
    }

    if config.target_channel_id == 0 {
        errors.push("ChannelId is required".to_string());
    }
    if config.target_channel_id == PLACEHOLDER_CHANNEL_ID {
        errors.push("ChannelId has not been configured (still using placeholder)".to_string());
    }

    if config.grace_period_secs == 0 {
        errors.push("ChannelGracePeriodSeconds must be non-zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
