//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

pub use parser::load_or_create_config;
pub use types::*;
pub use validate::validate_config;

use std::path::Path;

use crate::common::error::ConfigError;

/// Load (or create) the config file and apply environment overrides.
///
/// Validation is left to activation so an unconfigured bridge fails there.
pub fn load_with_env(path: impl AsRef<Path>) -> Result<BridgeConfig, ConfigError> {
    load_or_create_config(path).map(env::apply_env_overrides)
}
