//! mute-indicator-daemon: mirrors a meeting app's microphone state
//!
//! This daemon runs as a LaunchAgent and provides:
//! - A poll loop that asks the meeting app (through a scripted probe)
//!   whether the microphone is live
//! - Change detection so indicators only hear about real transitions
//! - Pluggable indicators (status bar glyph, screen border) rebuilt
//!   whenever the preferences change
//! - IPC server for the UI process that renders the indicators and
//!   edits the preferences

mod config;
mod events;
mod indicator;
mod ipc;
mod lifecycle;
mod poll;
mod preferences;
mod probe;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::runtime::Runtime;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::DaemonEvent;
use crate::indicator::{BuiltinIndicators, IndicatorRegistry};
use crate::ipc::Server;
use crate::lifecycle::{ReloadSignal, ShutdownSignal};
use crate::poll::PollLoop;
use crate::preferences::PreferenceStore;
use crate::probe::{CommandProbe, ScriptTemplate};

/// How long to wait at exit for blocking work, such as a probe that was
/// still running when shutdown was requested
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    let runtime = Runtime::new()?;
    let result = runtime.block_on(run());

    // An abandoned probe would otherwise keep the runtime from dropping
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);
    result
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "mute-indicator-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        ?config.preferences_path,
        poll_ms = config.poll_interval.as_millis() as u64,
        "configuration loaded"
    );

    let mut shutdown = ShutdownSignal::new()?;

    // Poll loop and indicators -> IPC server (status tracking, subscribers)
    let (event_tx, _event_rx) = broadcast::channel::<DaemonEvent>(64);

    let preferences = Arc::new(PreferenceStore::new(config.preferences_path.clone()));

    // Bind before building indicators so the server sees their first events
    let server = Server::new(&config.socket_path, Arc::clone(&preferences), event_tx.clone())?;

    let reload = ReloadSignal::new(Arc::clone(&preferences))?;
    tokio::spawn(reload.run());

    let probe = Arc::new(CommandProbe::new(
        config.probe_program.clone(),
        config.probe_args.clone(),
    ));
    let registry = IndicatorRegistry::new(
        Box::new(BuiltinIndicators::new(event_tx.clone())),
        event_tx.clone(),
    );
    let poll_loop = PollLoop::new(
        preferences,
        probe,
        ScriptTemplate::default(),
        registry,
        config.poll_interval,
        event_tx,
    );

    info!("daemon initialized, entering main loop");

    // Dropping the poll loop tears its indicators down, so every exit
    // path below leaves no indicator behind
    tokio::select! {
        _ = poll_loop.run(shutdown.wait()) => {
            info!("shutdown signal received");
        }

        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }
    }

    // Cleanup
    let status = server.status().await;
    info!(
        mute_state = ?status.mute_state,
        uptime_secs = status.uptime_secs,
        "shutting down..."
    );

    server.shutdown().await;

    info!("mute-indicator-daemon stopped");

    Ok(())
}
