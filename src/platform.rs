//! External messaging platform capabilities.
//!
//! The bridge only needs a handful of operations from the platform:
//! logging in, resolving the target channel, sending a message, setting a
//! presence line, logging out, and a stream of received messages.

use std::sync::Arc;

use serenity::async_trait;
use tokio::sync::mpsc;

use crate::common::error::PlatformResult;

/// Maximum length of a single platform message.
pub const MESSAGE_LIMIT: usize = 2000;

/// A channel that was resolved after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub id: u64,
    pub name: String,
}

/// A message received from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: u64,
    /// Best display name the platform offers for the sender.
    pub sender_name: String,
    /// Sent by a bot or other automated account.
    pub author_is_bot: bool,
    pub channel_id: u64,
    pub content: String,
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Short name shown to players, e.g. "Discord".
    fn name(&self) -> &str;

    /// Start a session with the given credential.
    async fn login(&self, credential: &str) -> PlatformResult<Arc<dyn Session>>;
}

/// A logged-in platform session.
#[async_trait]
pub trait Session: Send + Sync {
    /// Whether the session is still live. Turns `false` when it drops.
    fn is_connected(&self) -> bool;

    /// Take the stream of received messages. Yields `Some` once.
    async fn take_inbound(&self) -> Option<mpsc::UnboundedReceiver<InboundMessage>>;

    /// Resolve a channel id to a text channel this session can use.
    ///
    /// May wait for the platform to deliver channel metadata; callers bound it.
    async fn resolve_channel(&self, channel_id: u64) -> Option<ChannelHandle>;

    async fn send_message(&self, channel: &ChannelHandle, text: &str) -> PlatformResult<()>;

    async fn set_presence(&self, text: &str) -> PlatformResult<()>;

    /// Close the session and release its resources.
    async fn logout(&self);
}
