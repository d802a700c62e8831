//! Error types for the application.

use std::time::Duration;

use thiserror::Error;

/// Errors that stop the bridge from activating.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration invalid: {0}")]
    ConfigInvalid(#[from] ConfigError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(ConnectionError),
}

impl From<ConnectionError> for BridgeError {
    fn from(error: ConnectionError) -> Self {
        match error {
            ConnectionError::ConfigInvalid(config) => Self::ConfigInvalid(config),
            other => Self::ConnectionFailed(other),
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Errors raised while bringing up the platform session.
///
/// Every variant is terminal for the activation attempt; nothing retries.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("{0}")]
    ConfigInvalid(#[from] ConfigError),

    #[error("Login failed: {0}")]
    LoginFailed(#[source] PlatformError),

    #[error("Channel {channel_id} not found within {}s", .grace.as_secs_f64())]
    ChannelNotFound { channel_id: u64, grace: Duration },
}

/// Errors reported by the external platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Credential rejected: {message}")]
    LoginRejected { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Failed to send message: {message}")]
    SendFailed { message: String },

    #[error("Session is not connected")]
    NotConnected,

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),
}

/// Result type alias for platform operations.
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;
