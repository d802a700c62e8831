//! Periodic presence updates.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::bridge::connection::ConnectedHandle;
use crate::bridge::formatter::format_presence;
use crate::common::PresenceSample;
use crate::host::GameServer;

/// How often the presence line is refreshed.
pub const PRESENCE_INTERVAL: Duration = Duration::from_secs(5);

pub struct PresenceUpdater {
    handle: ConnectedHandle,
    game: Arc<dyn GameServer>,
    interval: Duration,
}

impl PresenceUpdater {
    pub fn new(handle: ConnectedHandle, game: Arc<dyn GameServer>) -> Self {
        Self {
            handle,
            game,
            interval: PRESENCE_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn sample(&self) -> PresenceSample {
        PresenceSample {
            connected_players: self.game.roster().count(),
            server_name: self.game.server_name(),
        }
    }

    /// Push the current sample once. Failures are logged and swallowed.
    pub async fn tick(&self) {
        let text = format_presence(&self.sample());
        if let Err(e) = self.handle.set_presence(&text).await {
            warn!("Failed to update presence: {}", e);
        }
    }

    /// Tick every interval until `shutdown_rx` changes.
    pub fn spawn(self, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => self.tick().await,
                }
            }
            debug!("Presence updater stopped");
        })
    }
}
