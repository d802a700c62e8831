//! In-memory platform used by the bridge tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serenity::async_trait;
use tokio::sync::mpsc;

use crate::common::error::{PlatformError, PlatformResult};
use crate::platform::{ChannelHandle, InboundMessage, Platform, Session};

/// Everything the bridge asked the platform to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Login(String),
    Send { channel_id: u64, text: String },
    Presence(String),
    Logout,
}

struct FakeState {
    valid_token: String,
    channels: Vec<ChannelHandle>,
    resolve_delay: Mutex<Duration>,
    calls_tx: mpsc::UnboundedSender<PlatformCall>,
    inbound_tx: Mutex<Option<mpsc::UnboundedSender<InboundMessage>>>,
    connected: AtomicBool,
    presence_failures: AtomicUsize,
    send_failures: AtomicUsize,
    slow_send: Mutex<Option<(String, Duration)>>,
}

impl FakeState {
    fn record(&self, call: PlatformCall) {
        let _ = self.calls_tx.send(call);
    }
}

pub struct FakePlatform {
    state: Arc<FakeState>,
}

impl FakePlatform {
    pub fn new(valid_token: &str, channels: &[(u64, &str)]) -> (Self, mpsc::UnboundedReceiver<PlatformCall>) {
        let (calls_tx, calls_rx) = mpsc::unbounded_channel();
        let state = FakeState {
            valid_token: valid_token.to_string(),
            channels: channels
                .iter()
                .map(|(id, name)| ChannelHandle {
                    id: *id,
                    name: name.to_string(),
                })
                .collect(),
            resolve_delay: Mutex::new(Duration::ZERO),
            calls_tx,
            inbound_tx: Mutex::new(None),
            connected: AtomicBool::new(false),
            presence_failures: AtomicUsize::new(0),
            send_failures: AtomicUsize::new(0),
            slow_send: Mutex::new(None),
        };
        (
            Self {
                state: Arc::new(state),
            },
            calls_rx,
        )
    }

    /// Delay channel resolution, as if metadata arrived late.
    pub fn set_resolve_delay(&self, delay: Duration) {
        *self.state.resolve_delay.lock().unwrap() = delay;
    }

    /// Fail the next `count` presence pushes.
    pub fn fail_presence(&self, count: usize) {
        self.state.presence_failures.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` message sends.
    pub fn fail_sends(&self, count: usize) {
        self.state.send_failures.store(count, Ordering::SeqCst);
    }

    /// Hold back sends whose text contains `pattern` for `delay`.
    pub fn delay_sends_containing(&self, pattern: &str, delay: Duration) {
        *self.state.slow_send.lock().unwrap() = Some((pattern.to_string(), delay));
    }

    /// Simulate the session dropping without a logout.
    pub fn drop_session(&self) {
        self.state.connected.store(false, Ordering::SeqCst);
    }

    /// Deliver a message as if the platform received it.
    pub fn deliver(&self, message: InboundMessage) {
        if let Some(tx) = self.state.inbound_tx.lock().unwrap().as_ref() {
            let _ = tx.send(message);
        }
    }
}

#[async_trait]
impl Platform for FakePlatform {
    fn name(&self) -> &str {
        "External"
    }

    async fn login(&self, credential: &str) -> PlatformResult<Arc<dyn Session>> {
        self.state.record(PlatformCall::Login(credential.to_string()));
        if credential != self.state.valid_token {
            return Err(PlatformError::LoginRejected {
                message: "401 Unauthorized".to_string(),
            });
        }

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        *self.state.inbound_tx.lock().unwrap() = Some(inbound_tx);
        self.state.connected.store(true, Ordering::SeqCst);

        Ok(Arc::new(FakeSession {
            state: Arc::clone(&self.state),
            inbound_rx: tokio::sync::Mutex::new(Some(inbound_rx)),
        }))
    }
}

struct FakeSession {
    state: Arc<FakeState>,
    inbound_rx: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<InboundMessage>>>,
}

#[async_trait]
impl Session for FakeSession {
    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    async fn take_inbound(&self) -> Option<mpsc::UnboundedReceiver<InboundMessage>> {
        self.inbound_rx.lock().await.take()
    }

    async fn resolve_channel(&self, channel_id: u64) -> Option<ChannelHandle> {
        let delay = *self.state.resolve_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state.channels.iter().find(|c| c.id == channel_id).cloned()
    }

    async fn send_message(&self, channel: &ChannelHandle, text: &str) -> PlatformResult<()> {
        if !self.is_connected() {
            return Err(PlatformError::NotConnected);
        }

        let delay = self
            .state
            .slow_send
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(pattern, _)| text.contains(pattern.as_str()))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if take_failure(&self.state.send_failures) {
            return Err(PlatformError::SendFailed {
                message: "500 Internal Server Error".to_string(),
            });
        }
        self.state.record(PlatformCall::Send {
            channel_id: channel.id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn set_presence(&self, text: &str) -> PlatformResult<()> {
        if take_failure(&self.state.presence_failures) {
            return Err(PlatformError::Network {
                message: "connection reset".to_string(),
            });
        }
        self.state.record(PlatformCall::Presence(text.to_string()));
        Ok(())
    }

    async fn logout(&self) {
        self.state.connected.store(false, Ordering::SeqCst);
        self.state.inbound_tx.lock().unwrap().take();
        self.state.record(PlatformCall::Logout);
    }
}

/// Consume one pending failure, if any.
fn take_failure(failures: &AtomicUsize) -> bool {
    failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Build an inbound message from a human in `channel_id`.
pub fn inbound(channel_id: u64, sender: &str, content: &str) -> InboundMessage {
    InboundMessage {
        sender_id: 1,
        sender_name: sender.to_string(),
        author_is_bot: false,
        channel_id,
        content: content.to_string(),
    }
}

/// Wait for the next recorded call.
pub async fn next_call(calls: &mut mpsc::UnboundedReceiver<PlatformCall>) -> PlatformCall {
    tokio::time::timeout(Duration::from_secs(2), calls.recv())
        .await
        .expect("timed out waiting for a platform call")
        .expect("platform call channel closed")
}

/// Wait for the next call that is not a presence update.
pub async fn next_non_presence_call(calls: &mut mpsc::UnboundedReceiver<PlatformCall>) -> PlatformCall {
    loop {
        match next_call(calls).await {
            PlatformCall::Presence(_) => continue,
            call => return call,
        }
    }
}

/// Assert that no further non-presence call shows up shortly.
pub async fn assert_no_call(calls: &mut mpsc::UnboundedReceiver<PlatformCall>) {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(150);
    loop {
        match tokio::time::timeout_at(deadline, calls.recv()).await {
            Err(_) | Ok(None) => return,
            Ok(Some(PlatformCall::Presence(_))) => continue,
            Ok(Some(call)) => panic!("unexpected platform call: {:?}", call),
        }
    }
}
