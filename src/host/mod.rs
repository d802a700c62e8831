//! Game server integration.
//!
//! The bridge never talks to a concrete game server. It sees the host
//! through [`GameServer`]: roster queries, a chat broadcast call, and an
//! event source that handlers subscribe to and unsubscribe from.

pub mod local;

use std::sync::Arc;

use crate::common::Rgb;

pub use local::LocalServer;

/// Events raised by the game server once a line is final.
///
/// Moderation and decoration by other add-ons have already been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ChatMessageFinal { sender: String, body: String, color: Rgb },
    JoinMessageFinal { message: String, color: Rgb },
    LeaveMessageFinal { message: String, color: Rgb },
}

/// Handle returned by [`GameServer::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Snapshot of the connected players.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub players: Vec<String>,
    pub max_players: usize,
}

impl Roster {
    pub fn count(&self) -> usize {
        self.players.len()
    }
}

/// Receives game events.
///
/// Called synchronously from the host's dispatch; implementations must not block.
pub trait GameEventHandler: Send + Sync {
    fn on_game_event(&self, event: &GameEvent);
}

/// The game server as seen by the bridge.
pub trait GameServer: Send + Sync {
    /// Display name of the server.
    fn server_name(&self) -> String;

    /// Version string of the host software.
    fn host_version(&self) -> String;

    /// Currently connected players.
    fn roster(&self) -> Roster;

    /// Deliver a line to every connected player.
    fn broadcast_chat_message(&self, text: &str, color: Rgb);

    fn subscribe(&self, handler: Arc<dyn GameEventHandler>) -> SubscriptionId;

    /// Returns `false` if the subscription was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
