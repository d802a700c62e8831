//! Configuration type definitions.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Token written into a freshly created config file.
pub const PLACEHOLDER_TOKEN: &str = "YOUR_BOT_TOKEN_HERE";

/// Channel id written into a freshly created config file.
pub const PLACEHOLDER_CHANNEL_ID: u64 = 123456789012345678;

/// Default format for game -> Discord chat lines.
pub const DEFAULT_DISCORD_FORMAT: &str = "%user: %message";

/// Default format for Discord -> game chat lines.
pub const DEFAULT_GAME_FORMAT: &str = "[%platform] %user: %message";

const DEFAULT_GRACE_PERIOD_SECS: u64 = 3;

/// Bridge configuration, stored as JSON next to the binary.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Bot token used to log in to the platform.
    #[serde(rename = "BotToken")]
    pub credential: String,
    /// The single channel the bridge reads from and writes to.
    #[serde(rename = "ChannelId")]
    pub target_channel_id: u64,
    /// Forward player join/leave lines to the channel.
    #[serde(rename = "JoinLeaveMessages", default)]
    pub relay_join_leave: bool,
    /// Announce bridge start/stop in the channel.
    #[serde(rename = "StartStopMessages", default = "default_true")]
    pub announce_lifecycle: bool,
    /// Upper bound on how long to wait for the channel after login.
    #[serde(rename = "ChannelGracePeriodSeconds", default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
    #[serde(rename = "DiscordMessageFormat", default = "default_discord_format")]
    pub discord_format: String,
    #[serde(rename = "GameMessageFormat", default = "default_game_format")]
    pub game_format: String,
}

impl BridgeConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            credential: PLACEHOLDER_TOKEN.to_string(),
            target_channel_id: PLACEHOLDER_CHANNEL_ID,
            relay_join_leave: false,
            announce_lifecycle: true,
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            discord_format: default_discord_format(),
            game_format: default_game_format(),
        }
    }
}

// The token must never reach the logs.
impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("credential", &"<redacted>")
            .field("target_channel_id", &self.target_channel_id)
            .field("relay_join_leave", &self.relay_join_leave)
            .field("announce_lifecycle", &self.announce_lifecycle)
            .field("grace_period_secs", &self.grace_period_secs)
            .field("discord_format", &self.discord_format)
            .field("game_format", &self.game_format)
            .finish()
    }
}

fn default_true() -> bool {
    true
}

fn default_grace_period_secs() -> u64 {
    DEFAULT_GRACE_PERIOD_SECS
}

fn default_discord_format() -> String {
    DEFAULT_DISCORD_FORMAT.to_string()
}

fn default_game_format() -> String {
    DEFAULT_GAME_FORMAT.to_string()
}
