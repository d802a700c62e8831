//! In-process game server.
//!
//! Backs the standalone runner: console lines become game events and
//! broadcasts are handed back on a channel for printing. Tests use it as
//! the game side of the bridge.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::common::Rgb;
use crate::host::{GameEvent, GameEventHandler, GameServer, Roster, SubscriptionId};

/// Color of join/leave lines.
pub const LIFECYCLE_COLOR: Rgb = Rgb::new(230.0 / 255.0, 241.0 / 255.0, 146.0 / 255.0);

/// Color of player chat lines.
pub const PLAYER_COLOR: Rgb = Rgb::new(1.0, 1.0, 1.0);

/// Sender name used for console lines without an explicit name.
pub const CONSOLE_SENDER: &str = "Console";

/// A line delivered to all players.
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub text: String,
    pub color: Rgb,
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Join(String),
    Leave(String),
    Chat { sender: String, body: String },
}

impl ConsoleInput {
    /// Parse `/join NAME`, `/leave NAME`, `NAME: text`, or plain text.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(name) = line.strip_prefix("/join ") {
            let name = name.trim();
            return (!name.is_empty()).then(|| Self::Join(name.to_string()));
        }
        if let Some(name) = line.strip_prefix("/leave ") {
            let name = name.trim();
            return (!name.is_empty()).then(|| Self::Leave(name.to_string()));
        }

        match line.split_once(": ") {
            Some((sender, body)) if !sender.trim().is_empty() && !sender.contains(' ') => {
                Some(Self::Chat {
                    sender: sender.trim().to_string(),
                    body: body.to_string(),
                })
            }
            _ => Some(Self::Chat {
                sender: CONSOLE_SENDER.to_string(),
                body: line.to_string(),
            }),
        }
    }
}

/// Game server living in this process.
pub struct LocalServer {
    name: String,
    version: String,
    max_players: usize,
    players: RwLock<Vec<String>>,
    handlers: Mutex<BTreeMap<u64, Arc<dyn GameEventHandler>>>,
    next_subscription: AtomicU64,
    broadcast_tx: mpsc::UnboundedSender<Broadcast>,
}

impl LocalServer {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        max_players: usize,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Broadcast>) {
        let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();
        let server = Arc::new(Self {
            name: name.into(),
            version: version.into(),
            max_players,
            players: RwLock::new(Vec::new()),
            handlers: Mutex::new(BTreeMap::new()),
            next_subscription: AtomicU64::new(1),
            broadcast_tx,
        });
        (server, broadcast_rx)
    }

    /// Add a player and raise the join event.
    pub fn join(&self, name: &str) {
        {
            let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
            if players.iter().any(|p| p == name) {
                debug!("{} is already connected", name);
                return;
            }
            players.push(name.to_string());
        }
        self.dispatch(&GameEvent::JoinMessageFinal {
            message: format!("{} joined the server", name),
            color: LIFECYCLE_COLOR,
        });
    }

    /// Remove a player and raise the leave event.
    pub fn leave(&self, name: &str) {
        {
            let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
            let before = players.len();
            players.retain(|p| p != name);
            if players.len() == before {
                debug!("{} is not connected", name);
                return;
            }
        }
        self.dispatch(&GameEvent::LeaveMessageFinal {
            message: format!("{} left the server", name),
            color: LIFECYCLE_COLOR,
        });
    }

    /// Raise a finalized chat line and show it to everyone.
    pub fn chat(&self, sender: &str, body: &str) {
        self.broadcast_chat_message(&format!("{}: {}", sender, body), PLAYER_COLOR);
        self.dispatch(&GameEvent::ChatMessageFinal {
            sender: sender.to_string(),
            body: body.to_string(),
            color: PLAYER_COLOR,
        });
    }

    pub fn apply_console_input(&self, input: ConsoleInput) {
        match input {
            ConsoleInput::Join(name) => self.join(&name),
            ConsoleInput::Leave(name) => self.leave(&name),
            ConsoleInput::Chat { sender, body } => self.chat(&sender, &body),
        }
    }

    /// Invoke every subscribed handler with `event`.
    pub fn dispatch(&self, event: &GameEvent) {
        // Snapshot so handlers may (un)subscribe without deadlocking.
        let handlers: Vec<Arc<dyn GameEventHandler>> = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for handler in handlers {
            handler.on_game_event(event);
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl GameServer for LocalServer {
    fn server_name(&self) -> String {
        self.name.clone()
    }

    fn host_version(&self) -> String {
        self.version.clone()
    }

    fn roster(&self) -> Roster {
        Roster {
            players: self.players.read().unwrap_or_else(PoisonError::into_inner).clone(),
            max_players: self.max_players,
        }
    }

    fn broadcast_chat_message(&self, text: &str, color: Rgb) {
        let broadcast = Broadcast {
            text: text.to_string(),
            color,
        };
        if let Err(e) = self.broadcast_tx.send(broadcast) {
            warn!("Broadcast dropped, no listener: {}", e.0.text);
        }
    }

    fn subscribe(&self, handler: Arc<dyn GameEventHandler>) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handler);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id.0)
            .is_some()
    }
}
