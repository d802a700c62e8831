//! In-channel commands.
//!
//! Only `!info` is recognized. It is answered in the channel and never
//! reaches the game chat.

use crate::bridge::sanitize::mask_mentions;
use crate::host::GameServer;

/// The status command token, compared against the trimmed raw text.
pub const INFO_COMMAND: &str = "!info";

/// Name shown in the report footer.
const BRIDGE_NAME: &str = "cordbridge";

/// Commands that can be sent in the target channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Server status report (!info).
    Info,
}

impl BridgeCommand {
    /// Parse a command from trimmed message text. Matching is exact.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            INFO_COMMAND => Some(Self::Info),
            _ => None,
        }
    }
}

/// Build the `!info` status report.
///
/// Player names come from players and are masked before being echoed.
pub fn build_info_report(game: &dyn GameServer) -> String {
    let roster = game.roster();
    let mut lines = vec![
        format!("Name: {}", game.server_name()),
        format!("Player Count: {}/{}", roster.count(), roster.max_players),
    ];

    if !roster.players.is_empty() {
        lines.push("Player List:".to_string());
        lines.extend(roster.players.iter().map(|name| format!("- {}", mask_mentions(name))));
    }

    lines.push(format!(
        "-# {} version {} on {}",
        BRIDGE_NAME,
        env!("CARGO_PKG_VERSION"),
        game.host_version()
    ));

    lines.join("\n")
}
