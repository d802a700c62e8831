//! The chat bridge between the game server and the platform channel.
//!
//! ## Module Structure
//!
//! - `sanitize`: Text transforms for externally sourced text
//! - `formatter`: Placeholder substitution and message splitting
//! - `connection`: Session lifecycle (`ConnectionManager`, `ConnectedHandle`)
//! - `outbound`: Game chat to channel relay
//! - `inbound`: Channel to game chat relay
//! - `commands`: The `!info` status report
//! - `presence`: Periodic presence updates
//! - `orchestrator`: Activation and deactivation (`Bridge` struct)

pub mod commands;
pub mod connection;
pub mod formatter;
pub mod inbound;
pub mod orchestrator;
pub mod outbound;
pub mod presence;
pub mod sanitize;

pub use orchestrator::Bridge;
