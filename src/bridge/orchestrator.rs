//! Bridge orchestrator that ties the game server and the platform together.
//!
//! Activation connects first and only attaches the relays and the presence
//! loop once the connection is up. Deactivation detaches everything before
//! the session is closed.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bridge::connection::{ConnectedHandle, ConnectionManager};
use crate::bridge::formatter::format_bridge_announcement;
use crate::bridge::inbound::InboundRelay;
use crate::bridge::outbound::OutboundRelay;
use crate::bridge::presence::{PresenceUpdater, PRESENCE_INTERVAL};
use crate::common::error::BridgeError;
use crate::config::BridgeConfig;
use crate::host::{GameServer, SubscriptionId};
use crate::platform::Platform;

/// The chat bridge between one game server and one platform channel.
pub struct Bridge {
    config: BridgeConfig,
    platform: Arc<dyn Platform>,
    game: Arc<dyn GameServer>,
    presence_interval: Duration,
    /// Set between a successful `activate` and the matching `deactivate`.
    active: Option<ActiveBridge>,
}

/// Everything attached during one activation.
struct ActiveBridge {
    connection: ConnectionManager,
    handle: ConnectedHandle,
    subscription: SubscriptionId,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Bridge {
    pub fn new(config: BridgeConfig, platform: Arc<dyn Platform>, game: Arc<dyn GameServer>) -> Self {
        Self {
            config,
            platform,
            game,
            presence_interval: PRESENCE_INTERVAL,
            active: None,
        }
    }

    #[cfg(test)]
    pub fn with_presence_interval(mut self, interval: Duration) -> Self {
        self.presence_interval = interval;
        self
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Connect and attach the relays.
    ///
    /// Returns once the connection either succeeded or failed. On failure
    /// nothing is attached. Calling this while already active does nothing.
    pub async fn activate(&mut self) -> Result<(), BridgeError> {
        if self.active.is_some() {
            warn!("Bridge is already active");
            return Ok(());
        }

        let mut connection = ConnectionManager::new(Arc::clone(&self.platform));
        let handle = connection.connect(&self.config).await?;

        if self.config.announce_lifecycle {
            handle.send(format_bridge_announcement(&self.game.server_name(), true));
        }

        let outbound = OutboundRelay::new(
            handle.clone(),
            &self.config.discord_format,
            self.config.relay_join_leave,
        );
        let subscription = self.game.subscribe(Arc::new(outbound));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::with_capacity(2);

        match handle.session().take_inbound().await {
            Some(events) => {
                let inbound = InboundRelay::new(
                    handle.clone(),
                    Arc::clone(&self.game),
                    &self.config.game_format,
                    self.platform.name(),
                );
                tasks.push(inbound.spawn(events, shutdown_rx.clone()));
            }
            None => warn!("Inbound message stream was already taken, not relaying to the game"),
        }

        let presence = PresenceUpdater::new(handle.clone(), Arc::clone(&self.game))
            .with_interval(self.presence_interval);
        tasks.push(presence.spawn(shutdown_rx));

        info!(
            "Bridge active: {} <-> {} #{}",
            self.game.server_name(),
            self.platform.name(),
            handle.channel().name
        );

        self.active = Some(ActiveBridge {
            connection,
            handle,
            subscription,
            shutdown_tx,
            tasks,
        });
        Ok(())
    }

    /// Detach the relays, stop the presence loop, deliver pending lines and log out.
    ///
    /// Does nothing if the bridge is not active.
    pub async fn deactivate(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        if !self.game.unsubscribe(active.subscription) {
            warn!("Outbound relay was already unsubscribed");
        }

        let _ = active.shutdown_tx.send(true);
        for result in join_all(active.tasks).await {
            if let Err(e) = result {
                warn!("Bridge task ended abnormally: {}", e);
            }
        }

        // Last queued line; disconnect delivers it before logging out.
        if self.config.announce_lifecycle {
            active
                .handle
                .send(format_bridge_announcement(&self.game.server_name(), false));
        }

        active.connection.disconnect().await;
        info!("Bridge deactivated");
    }
}
