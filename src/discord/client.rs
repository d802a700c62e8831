//! Discord gateway client setup.
//!
//! Builds the serenity client and forwards gateway events into channels,
//! hiding serenity implementation details from the rest of the application.

use std::sync::Arc;
use std::time::Duration;

use serenity::async_trait;
use serenity::client::ClientBuilder;
use serenity::http::HttpBuilder;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::common::error::{PlatformError, PlatformResult};
use crate::platform::InboundMessage;

/// Forwards gateway events to the session.
///
/// The latest gateway [`Context`] is published on a watch channel; `None`
/// means the gateway is not (or no longer) connected.
pub(crate) struct GatewayEvents {
    inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    context_tx: Arc<watch::Sender<Option<Context>>>,
}

impl GatewayEvents {
    pub(crate) fn new(
        inbound_tx: mpsc::UnboundedSender<InboundMessage>,
        context_tx: Arc<watch::Sender<Option<Context>>>,
    ) -> Self {
        Self {
            inbound_tx,
            context_tx,
        }
    }
}

#[async_trait]
impl EventHandler for GatewayEvents {
    async fn ready(&self, context: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);
        self.context_tx.send_replace(Some(context));
    }

    async fn message(&self, _context: Context, message: Message) {
        let sender_name = pick_display_name(
            message.member.as_ref().and_then(|m| m.nick.as_deref()),
            message.author.global_name.as_deref(),
            &message.author.name,
        );

        let inbound = InboundMessage {
            sender_id: message.author.id.get(),
            sender_name,
            author_is_bot: message.author.bot,
            channel_id: message.channel_id.get(),
            content: message.content,
        };

        if let Err(e) = self.inbound_tx.send(inbound) {
            debug!("Dropping Discord message, nobody is listening: {}", e.0.content);
        }
    }
}

/// Guild nickname, then global display name, then username.
pub(crate) fn pick_display_name(nick: Option<&str>, global_name: Option<&str>, username: &str) -> String {
    [nick, global_name]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or(username)
        .to_string()
}

pub(crate) async fn build_client(token: &str, events: GatewayEvents) -> PlatformResult<Client> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    // Build a custom reqwest client with timeout settings
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| PlatformError::Network {
            message: e.to_string(),
        })?;

    // Build the Serenity HTTP client with our custom reqwest client
    let http = HttpBuilder::new(token).client(reqwest_client).build();

    let client = ClientBuilder::new_with_http(http, intents)
        .event_handler(events)
        .await?;
    Ok(client)
}
