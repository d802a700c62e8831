//! A logged-in Discord session.

use std::sync::Arc;
use std::time::Duration;

use serenity::all::{ActivityData, ChannelId, ChannelType, CreateAllowedMentions, CreateMessage};
use serenity::async_trait;
use serenity::gateway::ShardManager;
use serenity::http::Http;
use serenity::prelude::*;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::common::error::{PlatformError, PlatformResult};
use crate::platform::{ChannelHandle, InboundMessage, Session};

/// How long logout waits for the gateway task to wind down.
const LOGOUT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DiscordSession {
    http: Arc<Http>,
    shard_manager: Arc<ShardManager>,
    context_rx: watch::Receiver<Option<Context>>,
    inbound_rx: Mutex<Option<mpsc::UnboundedReceiver<InboundMessage>>>,
    client_task: Mutex<Option<JoinHandle<()>>>,
}

impl DiscordSession {
    pub(crate) fn new(
        http: Arc<Http>,
        shard_manager: Arc<ShardManager>,
        context_rx: watch::Receiver<Option<Context>>,
        inbound_rx: mpsc::UnboundedReceiver<InboundMessage>,
        client_task: JoinHandle<()>,
    ) -> Self {
        Self {
            http,
            shard_manager,
            context_rx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            client_task: Mutex::new(Some(client_task)),
        }
    }
}

#[async_trait]
impl Session for DiscordSession {
    fn is_connected(&self) -> bool {
        self.context_rx.borrow().is_some()
    }

    async fn take_inbound(&self) -> Option<mpsc::UnboundedReceiver<InboundMessage>> {
        self.inbound_rx.lock().await.take()
    }

    async fn resolve_channel(&self, channel_id: u64) -> Option<ChannelHandle> {
        if channel_id == 0 {
            return None;
        }

        // Channel lookups only make sense once the gateway is up.
        let mut context_rx = self.context_rx.clone();
        let ready = context_rx.wait_for(|context| context.is_some()).await.is_ok();
        if !ready {
            return None;
        }

        let channel = match ChannelId::new(channel_id).to_channel(&self.http).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!("Could not find channel with ID {}: {}", channel_id, e);
                return None;
            }
        };

        match channel.guild() {
            Some(guild_channel) if is_text_channel(guild_channel.kind) => Some(ChannelHandle {
                id: channel_id,
                name: guild_channel.name.clone(),
            }),
            _ => {
                warn!("Channel {} is not a guild text channel", channel_id);
                None
            }
        }
    }

    async fn send_message(&self, channel: &ChannelHandle, text: &str) -> PlatformResult<()> {
        // Text is already masked; also refuse pings at the API level.
        let builder = CreateMessage::new()
            .content(text)
            .allowed_mentions(CreateAllowedMentions::new());

        ChannelId::new(channel.id)
            .send_message(&self.http, builder)
            .await
            .map(|_| ())
            .map_err(|e| PlatformError::SendFailed {
                message: e.to_string(),
            })
    }

    async fn set_presence(&self, text: &str) -> PlatformResult<()> {
        let context = self.context_rx.borrow().clone();
        match context {
            Some(context) => {
                context.set_activity(Some(ActivityData::watching(text)));
                Ok(())
            }
            None => Err(PlatformError::NotConnected),
        }
    }

    async fn logout(&self) {
        info!("Initiating graceful Discord shutdown...");
        self.shard_manager.shutdown_all().await;

        if let Some(task) = self.client_task.lock().await.take() {
            match tokio::time::timeout(LOGOUT_TIMEOUT, task).await {
                Ok(Ok(())) => info!("Discord shutdown complete"),
                Ok(Err(e)) => warn!("Discord client task panicked: {}", e),
                Err(_) => warn!("Discord shutdown timed out"),
            }
        }
    }
}

fn is_text_channel(kind: ChannelType) -> bool {
    matches!(
        kind,
        ChannelType::Text
            | ChannelType::News
            | ChannelType::PublicThread
            | ChannelType::PrivateThread
            | ChannelType::NewsThread
    )
}
