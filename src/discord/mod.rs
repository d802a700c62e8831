//! Discord platform integration.
//!
//! Implements the platform capability set on top of serenity.

pub mod client;
pub mod session;

use std::sync::Arc;

use serenity::async_trait;
use serenity::http::HttpError;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use crate::common::error::{PlatformError, PlatformResult};
use crate::platform::{Platform, Session};

use client::{build_client, GatewayEvents};
pub use session::DiscordSession;

/// Discord as the external platform.
#[derive(Debug, Default)]
pub struct DiscordPlatform;

impl DiscordPlatform {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    fn name(&self) -> &str {
        "Discord"
    }

    async fn login(&self, credential: &str) -> PlatformResult<Arc<dyn Session>> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (context_tx, context_rx) = watch::channel(None);
        let context_tx = Arc::new(context_tx);

        let events = GatewayEvents::new(inbound_tx, Arc::clone(&context_tx));
        let mut client = build_client(credential, events).await?;

        // The gateway only reports a bad token asynchronously, so check it up front.
        match client.http.get_current_user().await {
            Ok(user) => info!("Logged in to Discord as {}", user.name),
            Err(serenity::Error::Http(HttpError::UnsuccessfulRequest(response))) => {
                return Err(PlatformError::LoginRejected {
                    message: format!("{} ({})", response.error.message, response.status_code),
                });
            }
            Err(e) => {
                return Err(PlatformError::Network {
                    message: e.to_string(),
                });
            }
        }

        let http = Arc::clone(&client.http);
        let shard_manager = Arc::clone(&client.shard_manager);

        let client_task = tokio::spawn(async move {
            match client.start().await {
                Ok(()) => info!("Discord client disconnected normally"),
                Err(e) => error!("Discord client error: {}", e),
            }
            context_tx.send_replace(None);
        });

        Ok(Arc::new(DiscordSession::new(
            http,
            shard_manager,
            context_rx,
            inbound_rx,
            client_task,
        )))
    }
}
