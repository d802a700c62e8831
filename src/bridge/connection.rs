//! Platform connection lifecycle.
//!
//! A [`ConnectionManager`] lives for one activation of the bridge:
//! - `Disconnected` -> `Connecting` when [`ConnectionManager::connect`] starts
//! - `Connecting` -> `Connected` once login succeeded and the channel resolved
//! - `Connecting` -> `Failed` on invalid config, rejected login or a missing channel
//! - `Connected` -> `Disconnected` on [`ConnectionManager::disconnect`]
//!
//! Nothing reconnects. A session that drops while connected turns every
//! send into a no-op until the bridge is deactivated. Lines already queued
//! when `disconnect` is called are delivered before the logout.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bridge::formatter::split_message;
use crate::common::error::{ConnectionError, PlatformResult};
use crate::config::{validate_config, BridgeConfig};
use crate::platform::{ChannelHandle, Platform, Session, MESSAGE_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Failed, Connecting)
                | (Connecting, Connected)
                | (Connecting, Failed)
                | (Connected, Disconnected)
        )
    }
}

/// Owns the platform session for one activation.
pub struct ConnectionManager {
    platform: Arc<dyn Platform>,
    state: ConnectionState,
    handle: Option<ConnectedHandle>,
}

impl ConnectionManager {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            state: ConnectionState::Disconnected,
            handle: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Validate the config, log in and resolve the target channel.
    ///
    /// The login is skipped entirely when the config is invalid. A channel
    /// that does not show up within the grace period logs the session out
    /// again before the error is returned.
    pub async fn connect(&mut self, config: &BridgeConfig) -> Result<ConnectedHandle, ConnectionError> {
        if let Some(handle) = &self.handle {
            return Ok(handle.clone());
        }

        self.transition(ConnectionState::Connecting);
        match self.establish(config).await {
            Ok(handle) => {
                self.transition(ConnectionState::Connected);
                self.handle = Some(handle.clone());
                Ok(handle)
            }
            Err(e) => {
                error!("Failed to connect to {}: {}", self.platform.name(), e);
                self.transition(ConnectionState::Failed);
                Err(e)
            }
        }
    }

    async fn establish(&self, config: &BridgeConfig) -> Result<ConnectedHandle, ConnectionError> {
        validate_config(config)?;

        info!("Connecting to {}...", self.platform.name());
        let session = self
            .platform
            .login(&config.credential)
            .await
            .map_err(ConnectionError::LoginFailed)?;

        let grace = config.grace_period();
        let resolved = tokio::time::timeout(grace, session.resolve_channel(config.target_channel_id)).await;
        let channel = match resolved {
            Ok(Some(channel)) => channel,
            Ok(None) | Err(_) => {
                session.logout().await;
                return Err(ConnectionError::ChannelNotFound {
                    channel_id: config.target_channel_id,
                    grace,
                });
            }
        };

        info!(
            "Connected to {} channel #{} ({})",
            self.platform.name(),
            channel.name,
            channel.id
        );
        Ok(ConnectedHandle::new(session, channel))
    }

    /// Stop accepting lines, deliver the queued ones and log out.
    ///
    /// A no-op unless connected.
    pub async fn disconnect(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        handle.close();
        handle.drain().await;
        handle.session().logout().await;
        self.transition(ConnectionState::Disconnected);
        info!("Disconnected from {}", self.platform.name());
    }

    fn transition(&mut self, next: ConnectionState) {
        if !self.state.can_transition_to(next) {
            warn!("Unexpected connection state change {:?} -> {:?}", self.state, next);
        }
        debug!("Connection state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Shared access to a connected session and its resolved channel.
///
/// Outgoing lines go through one queue drained by a single forwarding task,
/// so they reach the channel in the order they were sent. Clones share the
/// queue. Once closed, or once the session drops, every operation becomes a
/// no-op.
#[derive(Clone)]
pub struct ConnectedHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    session: Arc<dyn Session>,
    channel: ChannelHandle,
    open: AtomicBool,
    outgoing_tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectedHandle {
    /// Must be called from within a tokio runtime.
    pub fn new(session: Arc<dyn Session>, channel: ChannelHandle) -> Self {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let forwarder = tokio::spawn(forward_outgoing(
            Arc::clone(&session),
            channel.clone(),
            outgoing_rx,
        ));

        Self {
            inner: Arc::new(HandleInner {
                session,
                channel,
                open: AtomicBool::new(true),
                outgoing_tx: Mutex::new(Some(outgoing_tx)),
                forwarder: Mutex::new(Some(forwarder)),
            }),
        }
    }

    pub fn channel(&self) -> &ChannelHandle {
        &self.inner.channel
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.inner.session
    }

    pub fn is_live(&self) -> bool {
        self.inner.open.load(Ordering::SeqCst) && self.inner.session.is_connected()
    }

    /// Queue `text` for the target channel without waiting.
    ///
    /// Safe to call from synchronous game event handlers.
    pub fn send(&self, text: impl Into<String>) {
        if !self.is_live() {
            debug!("Not connected, dropping outgoing message");
            return;
        }

        let outgoing_tx = self.inner.outgoing_tx.lock().unwrap_or_else(PoisonError::into_inner);
        match outgoing_tx.as_ref() {
            Some(tx) => {
                if tx.send(text.into()).is_err() {
                    debug!("Outgoing forwarder stopped, dropping message");
                }
            }
            None => debug!("Outgoing queue closed, dropping message"),
        }
    }

    pub async fn set_presence(&self, text: &str) -> PlatformResult<()> {
        if !self.is_live() {
            return Ok(());
        }
        self.inner.session.set_presence(text).await
    }

    fn close(&self) {
        self.inner.open.store(false, Ordering::SeqCst);
    }

    /// Close the queue and wait until every queued line was handed to the platform.
    async fn drain(&self) {
        drop(
            self.inner
                .outgoing_tx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );

        let forwarder = self.inner.forwarder.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(forwarder) = forwarder {
            if let Err(e) = forwarder.await {
                warn!("Outgoing forwarder ended abnormally: {}", e);
            }
        }
    }
}

/// Deliver queued lines one at a time, in order.
///
/// A failed send is logged and skipped; the next line is still attempted.
async fn forward_outgoing(
    session: Arc<dyn Session>,
    channel: ChannelHandle,
    mut outgoing_rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(text) = outgoing_rx.recv().await {
        if !session.is_connected() {
            debug!("Session dropped, discarding outgoing message");
            continue;
        }

        for chunk in split_message(&text, MESSAGE_LIMIT) {
            if let Err(e) = session.send_message(&channel, &chunk).await {
                warn!("Failed to send message to #{}: {}", channel.name, e);
                break;
            }
        }
    }
    debug!("Outgoing forwarder for #{} stopped", channel.name);
}

impl fmt::Debug for ConnectedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedHandle")
            .field("channel", &self.inner.channel)
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{assert_no_call, next_call, FakePlatform, PlatformCall};

    const TOKEN: &str = "valid-token";
    const CHANNEL: u64 = 42;

    fn make_config(token: &str, channel: u64) -> BridgeConfig {
        BridgeConfig {
            credential: token.to_string(),
            target_channel_id: channel,
            grace_period_secs: 1,
            ..BridgeConfig::default()
        }
    }

    #[test]
    fn test_state_transitions() {
        use ConnectionState::*;
        assert!(Disconnected.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connecting.can_transition_to(Failed));
        assert!(Connected.can_transition_to(Disconnected));
        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!Failed.can_transition_to(Connected));
        assert!(!Connected.can_transition_to(Failed));
    }

    #[tokio::test]
    async fn test_placeholder_config_never_logs_in() {
        let (platform, mut calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        let mut manager = ConnectionManager::new(Arc::new(platform));

        let result = manager.connect(&BridgeConfig::default()).await;

        assert!(matches!(result, Err(ConnectionError::ConfigInvalid(_))));
        assert_eq!(manager.state(), ConnectionState::Failed);
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejected_login_fails() {
        let (platform, mut calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        let mut manager = ConnectionManager::new(Arc::new(platform));

        let result = manager.connect(&make_config("wrong", CHANNEL)).await;

        assert!(matches!(result, Err(ConnectionError::LoginFailed(_))));
        assert_eq!(manager.state(), ConnectionState::Failed);
        assert_eq!(next_call(&mut calls).await, PlatformCall::Login("wrong".to_string()));
        assert_no_call(&mut calls).await;
    }

    #[tokio::test]
    async fn test_missing_channel_logs_out() {
        let (platform, mut calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        let mut manager = ConnectionManager::new(Arc::new(platform));

        let result = manager.connect(&make_config(TOKEN, 7)).await;

        assert!(matches!(
            result,
            Err(ConnectionError::ChannelNotFound { channel_id: 7, .. })
        ));
        assert_eq!(manager.state(), ConnectionState::Failed);
        assert_eq!(next_call(&mut calls).await, PlatformCall::Login(TOKEN.to_string()));
        assert_eq!(next_call(&mut calls).await, PlatformCall::Logout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_after_grace_period_fails() {
        let (platform, mut calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        platform.set_resolve_delay(Duration::from_secs(5));
        let mut manager = ConnectionManager::new(Arc::new(platform));

        let result = manager.connect(&make_config(TOKEN, CHANNEL)).await;

        assert!(matches!(result, Err(ConnectionError::ChannelNotFound { .. })));
        assert_eq!(next_call(&mut calls).await, PlatformCall::Login(TOKEN.to_string()));
        assert_eq!(next_call(&mut calls).await, PlatformCall::Logout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_within_grace_period_connects() {
        let (platform, _calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        platform.set_resolve_delay(Duration::from_millis(500));
        let mut manager = ConnectionManager::new(Arc::new(platform));

        let handle = manager.connect(&make_config(TOKEN, CHANNEL)).await.unwrap();

        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(handle.channel().name, "general");
    }

    #[tokio::test]
    async fn test_send_and_disconnect() {
        let (platform, mut calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        let mut manager = ConnectionManager::new(Arc::new(platform));
        let handle = manager.connect(&make_config(TOKEN, CHANNEL)).await.unwrap();
        assert_eq!(next_call(&mut calls).await, PlatformCall::Login(TOKEN.to_string()));

        handle.send("hello");
        assert_eq!(
            next_call(&mut calls).await,
            PlatformCall::Send {
                channel_id: CHANNEL,
                text: "hello".to_string()
            }
        );

        manager.disconnect().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(next_call(&mut calls).await, PlatformCall::Logout);
        assert!(!handle.is_live());

        handle.send("after");
        assert_no_call(&mut calls).await;
    }

    #[tokio::test]
    async fn test_dropped_session_makes_sends_noops() {
        let (platform, mut calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        let platform = Arc::new(platform);
        let mut manager = ConnectionManager::new(platform.clone());
        let handle = manager.connect(&make_config(TOKEN, CHANNEL)).await.unwrap();
        next_call(&mut calls).await;

        platform.drop_session();
        handle.send("lost");

        assert!(!handle.is_live());
        assert_no_call(&mut calls).await;
    }

    #[tokio::test]
    async fn test_long_messages_are_split() {
        let (platform, mut calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        let mut manager = ConnectionManager::new(Arc::new(platform));
        let handle = manager.connect(&make_config(TOKEN, CHANNEL)).await.unwrap();
        next_call(&mut calls).await;

        let long = format!("{} {}", "a".repeat(MESSAGE_LIMIT), "b".repeat(10));
        handle.send(long);

        let PlatformCall::Send { text: first, .. } = next_call(&mut calls).await else {
            panic!("expected a send");
        };
        let PlatformCall::Send { text: second, .. } = next_call(&mut calls).await else {
            panic!("expected a send");
        };
        assert_eq!(first.len(), MESSAGE_LIMIT);
        assert_eq!(second, "b".repeat(10));
    }

    fn sent(text: &str) -> PlatformCall {
        PlatformCall::Send {
            channel_id: CHANNEL,
            text: text.to_string(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lines_arrive_in_send_order() {
        let (platform, mut calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        platform.delay_sends_containing("first", Duration::from_millis(50));
        let mut manager = ConnectionManager::new(Arc::new(platform));
        let handle = manager.connect(&make_config(TOKEN, CHANNEL)).await.unwrap();
        next_call(&mut calls).await;

        handle.send("Alice: first");
        handle.send("Alice: second");

        assert_eq!(next_call(&mut calls).await, sent("Alice: first"));
        assert_eq!(next_call(&mut calls).await, sent("Alice: second"));
    }

    #[tokio::test]
    async fn test_disconnect_delivers_queued_lines_before_logout() {
        let (platform, mut calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        platform.delay_sends_containing("slow", Duration::from_millis(50));
        let mut manager = ConnectionManager::new(Arc::new(platform));
        let handle = manager.connect(&make_config(TOKEN, CHANNEL)).await.unwrap();
        next_call(&mut calls).await;

        handle.send("slow line");
        handle.send("queued line");
        manager.disconnect().await;

        assert_eq!(next_call(&mut calls).await, sent("slow line"));
        assert_eq!(next_call(&mut calls).await, sent("queued line"));
        assert_eq!(next_call(&mut calls).await, PlatformCall::Logout);
    }

    #[tokio::test]
    async fn test_failed_send_does_not_stop_later_lines() {
        let (platform, mut calls) = FakePlatform::new(TOKEN, &[(CHANNEL, "general")]);
        let platform = Arc::new(platform);
        let mut manager = ConnectionManager::new(platform.clone());
        let handle = manager.connect(&make_config(TOKEN, CHANNEL)).await.unwrap();
        next_call(&mut calls).await;

        platform.fail_sends(1);
        handle.send("lost");
        handle.send("kept");

        assert_eq!(next_call(&mut calls).await, sent("kept"));
        assert!(handle.is_live());
        assert_no_call(&mut calls).await;
    }
}
