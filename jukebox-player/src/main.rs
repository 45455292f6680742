//! Jukebox Player (jukebox-player) - Main entry point
//!
//! Runs the coordinator with the bundled local host: commands are read from
//! stdin, replies and status displays are printed, and audio is played through
//! a local player process. Exits on Ctrl+C, SIGTERM, or end of input.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jukebox_common::config::{load_toml_config, resolve_secret_token, TOKEN_ENV_VAR};
use jukebox_common::events::EventBus;
use jukebox_player::config::TomlConfig;
use jukebox_player::host::{run_console, ConsoleChat, LocalVoiceGateway};
use jukebox_player::liveness;
use jukebox_player::resolver::YtDlpResolver;
use jukebox_player::room::RoomDeps;
use jukebox_player::Coordinator;

/// Command-line arguments for jukebox-player
#[derive(Parser, Debug)]
#[command(name = "jukebox-player")]
#[command(about = "Per-room media queue coordinator")]
#[command(version)]
struct Args {
    /// TOML configuration file (defaults to the user config directory)
    #[arg(short, long, env = "JUKEBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Liveness endpoint port (overrides the config file)
    #[arg(short, long, env = "JUKEBOX_LIVENESS_PORT")]
    port: Option<u16>,

    /// Log level (overrides the config file; RUST_LOG wins over both)
    #[arg(long, env = "JUKEBOX_LOG_LEVEL")]
    log_level: Option<String>,

    /// Command prefix (overrides the config file)
    #[arg(long)]
    prefix: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config: TomlConfig =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.liveness_port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(prefix) = args.prefix {
        config.command_prefix = prefix;
    }

    let default_filter = format!(
        "jukebox_player={level},jukebox_common={level},tower_http={level}",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let token = resolve_secret_token(TOKEN_ENV_VAR)
        .with_context(|| format!("{} must be set to start", TOKEN_ENV_VAR))?;

    info!("Starting Jukebox Player v{}", env!("CARGO_PKG_VERSION"));
    debug!("Platform token loaded: {:?}", token);

    let settings = Arc::new(config.settings());
    let events = EventBus::default();
    spawn_event_logger(&events);

    let chat = Arc::new(ConsoleChat::new());
    let deps = RoomDeps {
        gateway: Arc::new(LocalVoiceGateway::new(config.player_command.clone())),
        chat: chat.clone(),
        resolver: Arc::new(YtDlpResolver::new(
            config.ytdlp_command.clone(),
            settings.resolve_timeout,
        )),
        events,
        settings,
    };

    let port = config.liveness_port;
    tokio::spawn(async move {
        if let Err(e) = liveness::serve(port).await {
            error!("Liveness endpoint stopped: {}", e);
        }
    });

    let (coordinator, handle) = Coordinator::new(deps);
    let coordinator_task = tokio::spawn(coordinator.run());

    let identity = config.console_identity();
    let console = run_console(handle, chat, identity);

    tokio::select! {
        _ = shutdown_signal() => {}
        result = console => {
            match result {
                Ok(()) => info!("Console input closed, shutting down"),
                Err(e) => warn!("Console stopped: {}", e),
            }
        }
    }

    // Dropping the console's handle lets the coordinator wind down its rooms
    if tokio::time::timeout(std::time::Duration::from_secs(5), coordinator_task)
        .await
        .is_err()
    {
        warn!("Coordinator did not stop in time");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Log every published event at debug
fn spawn_event_logger(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => debug!("Event: {:?}", event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event logger lagged, {} events skipped", n)
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
