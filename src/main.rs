//! Cordbridge - Discord chat bridge for multiplayer game servers
//!
//! Relays chat between a game server and a single Discord channel,
//! publishes the player count as bot presence and answers `!info`.
//!
//! The standalone binary runs the bridge against an in-process server
//! driven from stdin: `/join NAME`, `/leave NAME`, `NAME: text` or plain text.

mod bridge;
mod common;
mod config;
mod discord;
mod host;
mod platform;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};

use bridge::Bridge;
use config::env::{get_config_path, get_max_players, get_server_name};
use discord::DiscordPlatform;
use host::local::ConsoleInput;
use host::LocalServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Cordbridge v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = config::load_with_env(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} is valid JSON.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Channel: {}", config.target_channel_id);
    info!("  Join/leave messages: {}", config.relay_join_leave);
    info!("  Start/stop messages: {}", config.announce_lifecycle);

    let (server, mut broadcasts) =
        LocalServer::new(get_server_name(), env!("CARGO_PKG_VERSION"), get_max_players());

    let mut bridge = Bridge::new(config, Arc::new(DiscordPlatform::new()), server.clone());
    if let Err(e) = bridge.activate().await {
        error!("Failed to activate bridge: {}", e);
        // Give a moment for error logs to flush
        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
        std::process::exit(1);
    }

    // Game chat as players would see it
    let printer = tokio::spawn(async move {
        while let Some(broadcast) = broadcasts.recv().await {
            println!("{}", broadcast.text);
        }
    });

    let console = {
        let server = server.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(input) = ConsoleInput::parse(&line) {
                            server.apply_console_input(input);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read console input: {}", e);
                        break;
                    }
                }
            }
            info!("Console input closed");
        })
    };

    tokio::select! {
        _ = shutdown_signal() => info!("Shutdown signal received - deactivating bridge..."),
        _ = console => {}
    }

    bridge.deactivate().await;
    printer.abort();

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
