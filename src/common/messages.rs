//! Canonical message types for bridge communication.
//!
//! This module defines the single source of truth for message types
//! exchanged between the game server and the external platform.

use crate::host::GameEvent;

/// Presentation color as an RGB triple with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a color from 8-bit channel values.
    #[cfg(test)]
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }
}

/// Color used for every line relayed into the game from the external platform.
pub const EXTERNAL_COLOR: Rgb = Rgb::new(0.345, 0.396, 0.949);

/// Which side raised a chat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Game,
    External,
}

/// What a chat event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    /// A line typed by a user.
    Chat,
    /// A player joined the game server.
    Join,
    /// A player left the game server.
    Leave,
}

/// A single chat line crossing the bridge.
///
/// An empty `sender` marks a system/lifecycle line rather than a user.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEvent {
    pub origin: Origin,
    pub kind: ChatKind,
    pub sender: String,
    pub body: String,
    pub color: Rgb,
}

impl ChatEvent {
    /// A chat line from the external platform, shown in `EXTERNAL_COLOR`.
    pub fn external(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            origin: Origin::External,
            kind: ChatKind::Chat,
            sender: sender.into(),
            body: body.into(),
            color: EXTERNAL_COLOR,
        }
    }

    /// Whether this event carries no user, i.e. it is a lifecycle line.
    pub fn is_lifecycle(&self) -> bool {
        self.sender.is_empty()
    }
}

impl From<&GameEvent> for ChatEvent {
    fn from(event: &GameEvent) -> Self {
        let (kind, sender, body, color) = match event {
            GameEvent::ChatMessageFinal { sender, body, color } => {
                (ChatKind::Chat, sender.clone(), body.clone(), *color)
            }
            GameEvent::JoinMessageFinal { message, color } => {
                (ChatKind::Join, String::new(), message.clone(), *color)
            }
            GameEvent::LeaveMessageFinal { message, color } => {
                (ChatKind::Leave, String::new(), message.clone(), *color)
            }
        };

        Self {
            origin: Origin::Game,
            kind,
            sender,
            body,
            color,
        }
    }
}

/// Live presence numbers, recomputed on every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSample {
    pub connected_players: usize,
    pub server_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_event_has_no_sender() {
        let event = GameEvent::JoinMessageFinal {
            message: "Alice joined the server".to_string(),
            color: Rgb::from_u8(230, 241, 146),
        };
        let chat = ChatEvent::from(&event);
        assert_eq!(chat.kind, ChatKind::Join);
        assert_eq!(chat.origin, Origin::Game);
        assert!(chat.is_lifecycle());
    }

    #[test]
    fn test_chat_event_keeps_sender() {
        let event = GameEvent::ChatMessageFinal {
            sender: "Alice".to_string(),
            body: "hi".to_string(),
            color: Rgb::new(1.0, 1.0, 1.0),
        };
        let chat = ChatEvent::from(&event);
        assert_eq!(chat.kind, ChatKind::Chat);
        assert_eq!(chat.sender, "Alice");
        assert!(!chat.is_lifecycle());
    }

    #[test]
    fn test_external_event_uses_external_color() {
        let chat = ChatEvent::external("Bob", "hello");
        assert_eq!(chat.origin, Origin::External);
        assert_eq!(chat.kind, ChatKind::Chat);
        assert_eq!(chat.color, EXTERNAL_COLOR);
        assert!(!chat.is_lifecycle());
    }

    #[test]
    fn test_from_u8() {
        let color = Rgb::from_u8(255, 0, 51);
        assert_eq!(color.r, 1.0);
        assert_eq!(color.g, 0.0);
        assert!((color.b - 0.2).abs() < f32::EPSILON);
    }
}
