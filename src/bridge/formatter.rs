//! Message formatting for display.
//!
//! Handles placeholder substitution in message format strings.
//! Supports placeholders: %time, %user, %message, %platform, %server

use chrono::Local;

use crate::common::PresenceSample;

const PLACEHOLDERS: [&str; 5] = ["%time", "%user", "%message", "%platform", "%server"];

/// Message formatter that substitutes placeholders in format strings.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    /// Format string for this formatter.
    format: String,
}

impl MessageFormatter {
    /// Create a new formatter with the given format string.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    /// Format a message with the given context.
    ///
    /// Substitutes the following placeholders:
    /// - `%time` - Current time (HH:MM:SS)
    /// - `%user` - Username/sender
    /// - `%message` - The actual message content
    /// - `%platform` - Name of the external platform
    /// - `%server` - Game server display name
    ///
    /// Substitution is a single pass, so a sender named `%message` stays literal.
    pub fn format(&self, ctx: &FormatContext) -> String {
        let mut result = String::with_capacity(self.format.len() + ctx.message.len());
        let mut rest = self.format.as_str();

        while let Some(pos) = rest.find('%') {
            result.push_str(&rest[..pos]);
            rest = &rest[pos..];

            match PLACEHOLDERS.iter().find(|p| rest.starts_with(**p)) {
                Some(&placeholder) => {
                    match placeholder {
                        "%time" => result.push_str(&get_time()),
                        "%user" => result.push_str(&ctx.user),
                        "%message" => result.push_str(&ctx.message),
                        "%platform" => result.push_str(&ctx.platform),
                        _ => result.push_str(&ctx.server),
                    }
                    rest = &rest[placeholder.len()..];
                }
                None => {
                    result.push('%');
                    rest = &rest[1..];
                }
            }
        }

        result.push_str(rest);
        result
    }
}

/// Context for message formatting.
#[derive(Debug, Clone, Default)]
pub struct FormatContext {
    /// The sender's name.
    pub user: String,
    /// The message content.
    pub message: String,
    /// External platform name.
    pub platform: String,
    /// Game server name.
    pub server: String,
}

impl FormatContext {
    /// Create a new format context.
    pub fn new(user: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Set the platform name.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Set the server name.
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }
}

/// Join/leave and other sender-less lines are shown bold.
pub fn format_lifecycle_line(message: &str) -> String {
    format!("**{}**", message)
}

/// Announcement sent when the bridge starts or stops.
pub fn format_bridge_announcement(server_name: &str, started: bool) -> String {
    if started {
        format!("🟢 Server **{}** Started!", server_name)
    } else {
        format!("🔴 Server **{}** Stopped!", server_name)
    }
}

/// Presence line, e.g. "1 player on Arena" or "3 players on Arena".
pub fn format_presence(sample: &PresenceSample) -> String {
    let noun = if sample.connected_players == 1 {
        "player"
    } else {
        "players"
    };
    format!("{} {} on {}", sample.connected_players, noun, sample.server_name)
}

/// Get the current time as HH:MM:SS string.
fn get_time() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Find the last UTF-8 char boundary at or before `byte_index` in `s`.
///
/// Returns a byte offset that is safe to use for slicing `s`.
fn floor_char_boundary(s: &str, byte_index: usize) -> usize {
    if byte_index >= s.len() {
        return s.len();
    }
    let mut i = byte_index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Split a message into chunks that fit within the max length (in bytes).
///
/// Prefers line breaks, then spaces. Never splits in the middle of a
/// multi-byte UTF-8 character.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.len() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = message;

    while !remaining.is_empty() {
        // Skip separators left over from previous splits
        remaining = remaining.trim_start_matches([' ', '\n']);
        if remaining.is_empty() {
            break;
        }

        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let split_at = floor_char_boundary(remaining, max_len);

        // If max_len is smaller than the first character, force at least one
        // character to avoid an infinite loop.
        if split_at == 0 {
            let first_char_end = remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len());
            chunks.push(remaining[..first_char_end].to_string());
            remaining = &remaining[first_char_end..];
            continue;
        }

        let chunk = &remaining[..split_at];

        let separator = chunk.rfind('\n').or_else(|| chunk.rfind(' '));
        match separator {
            Some(idx) if idx > 0 => {
                chunks.push(remaining[..idx].to_string());
                remaining = &remaining[idx + 1..];
            }
            _ => {
                // No separator found, hard split at char boundary
                chunks.push(chunk.to_string());
                remaining = &remaining[split_at..];
            }
        }
    }

    chunks
}
