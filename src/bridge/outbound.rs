//! Game chat to platform relay.

use tracing::debug;

use crate::bridge::connection::ConnectedHandle;
use crate::bridge::formatter::{format_lifecycle_line, FormatContext, MessageFormatter};
use crate::bridge::sanitize::mask_mentions;
use crate::common::{ChatEvent, ChatKind, Origin};
use crate::host::{GameEvent, GameEventHandler};

/// Forwards finalized game chat to the target channel.
///
/// Registered as a game event handler; never blocks the game's chat path.
pub struct OutboundRelay {
    handle: ConnectedHandle,
    formatter: MessageFormatter,
    relay_join_leave: bool,
}

impl OutboundRelay {
    pub fn new(handle: ConnectedHandle, format: &str, relay_join_leave: bool) -> Self {
        Self {
            handle,
            formatter: MessageFormatter::new(format),
            relay_join_leave,
        }
    }

    /// The line to send for `event`, or `None` if it is not forwarded.
    pub fn render(&self, event: &ChatEvent) -> Option<String> {
        if event.origin != Origin::Game {
            return None;
        }

        if event.is_lifecycle() {
            let is_join_leave = matches!(event.kind, ChatKind::Join | ChatKind::Leave);
            if !self.relay_join_leave || !is_join_leave || event.body.trim().is_empty() {
                return None;
            }
            return Some(format_lifecycle_line(&mask_mentions(&event.body)));
        }

        let ctx = FormatContext::new(mask_mentions(&event.sender), mask_mentions(&event.body));
        Some(self.formatter.format(&ctx))
    }
}

impl GameEventHandler for OutboundRelay {
    fn on_game_event(&self, event: &GameEvent) {
        let chat = ChatEvent::from(event);
        match self.render(&chat) {
            Some(text) => self.handle.send(text),
            None => debug!("Not forwarding {:?} line", chat.kind),
        }
    }
}
