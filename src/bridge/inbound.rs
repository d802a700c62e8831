//! Platform to game chat relay.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::bridge::commands::{build_info_report, BridgeCommand};
use crate::bridge::connection::ConnectedHandle;
use crate::bridge::formatter::{FormatContext, MessageFormatter};
use crate::bridge::sanitize::{sanitize_content, sanitize_display_name};
use crate::common::ChatEvent;
use crate::host::GameServer;
use crate::platform::InboundMessage;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Sent by a bot account.
    IgnoredBot,
    /// Posted in some other channel.
    IgnoredChannel,
    /// Nothing left after sanitizing.
    Empty,
    /// A command was answered in the channel.
    Command(BridgeCommand),
    /// Broadcast to the players.
    Relayed(String),
    /// The bridge is shutting down or the session dropped.
    Inactive,
}

/// Forwards channel messages into the game chat.
pub struct InboundRelay {
    handle: ConnectedHandle,
    game: Arc<dyn GameServer>,
    formatter: MessageFormatter,
    platform_name: String,
}

impl InboundRelay {
    pub fn new(
        handle: ConnectedHandle,
        game: Arc<dyn GameServer>,
        format: &str,
        platform_name: impl Into<String>,
    ) -> Self {
        Self {
            handle,
            game,
            formatter: MessageFormatter::new(format),
            platform_name: platform_name.into(),
        }
    }

    /// Filter, sanitize and forward a single message.
    pub fn process(&self, message: &InboundMessage) -> InboundOutcome {
        if !self.handle.is_live() {
            return InboundOutcome::Inactive;
        }
        if message.author_is_bot {
            return InboundOutcome::IgnoredBot;
        }
        if message.channel_id != self.handle.channel().id {
            return InboundOutcome::IgnoredChannel;
        }

        let raw = message.content.trim();
        let content = sanitize_content(raw);
        if content.trim().is_empty() {
            debug!("Dropping empty message from {}", message.sender_name);
            return InboundOutcome::Empty;
        }

        if let Some(command) = BridgeCommand::parse(raw) {
            info!("{} requested {:?}", message.sender_name, command);
            match command {
                BridgeCommand::Info => self.handle.send(build_info_report(self.game.as_ref())),
            }
            return InboundOutcome::Command(command);
        }

        let event = ChatEvent::external(sanitize_display_name(&message.sender_name), content);
        let ctx = FormatContext::new(event.sender.as_str(), event.body.as_str())
            .with_platform(self.platform_name.as_str())
            .with_server(self.game.server_name());
        let line = self.formatter.format(&ctx);

        self.game.broadcast_chat_message(&line, event.color);
        InboundOutcome::Relayed(line)
    }

    /// Process messages from `events` until shutdown or the stream ends.
    pub fn spawn(
        self,
        mut events: mpsc::UnboundedReceiver<InboundMessage>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    message = events.recv() => match message {
                        Some(message) => {
                            let outcome = self.process(&message);
                            debug!("Inbound message from {}: {:?}", message.sender_name, outcome);
                        }
                        None => break,
                    },
                }
            }
            debug!("Inbound relay stopped");
        })
    }
}
