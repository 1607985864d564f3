//! Unix domain socket server for IPC
//!
//! Serves status snapshots and preference edits to the UI process, and
//! pushes every daemon event to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::events::DaemonEvent;
use crate::preferences::PreferenceStore;

use super::protocol::{read_message, write_message, DaemonStatus, Notification, Request, Response};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    state: Arc<RwLock<ServerState>>,
    shutdown_tx: broadcast::Sender<()>,
    event_tx: broadcast::Sender<DaemonEvent>,
    preferences: Arc<PreferenceStore>,
    status_task: JoinHandle<()>,
}

/// Shared server state
struct ServerState {
    status: DaemonStatus,
    start_time: std::time::Instant,
}

/// What a client handler needs from the server
#[derive(Clone)]
struct ClientContext {
    state: Arc<RwLock<ServerState>>,
    event_tx: broadcast::Sender<DaemonEvent>,
    preferences: Arc<PreferenceStore>,
}

impl Server {
    /// Bind the socket and start tracking daemon events for status queries
    pub fn new(
        socket_path: &Path,
        preferences: Arc<PreferenceStore>,
        event_tx: broadcast::Sender<DaemonEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(RwLock::new(ServerState {
            status: DaemonStatus::default(),
            start_time: std::time::Instant::now(),
        }));

        let status_task = tokio::spawn(track_status(event_tx.subscribe(), Arc::clone(&state)));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            state,
            shutdown_tx,
            event_tx,
            preferences,
            status_task,
        })
    }

    /// Current status snapshot
    pub async fn status(&self) -> DaemonStatus {
        let state = self.state.read().await;
        let mut status = state.status.clone();
        status.uptime_secs = state.start_time.elapsed().as_secs();
        status
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let ctx = ClientContext {
                        state: Arc::clone(&self.state),
                        event_tx: self.event_tx.clone(),
                        preferences: Arc::clone(&self.preferences),
                    };
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, ctx) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, ctx: ClientContext) -> Result<()> {
        let (mut reader, writer) = stream.into_split();
        let writer = Arc::new(Mutex::new(writer));
        let mut forwarder: Option<JoinHandle<()>> = None;

        let result = loop {
            let request: Request = match read_message(&mut reader).await {
                Ok(Some(request)) => request,
                Ok(None) => {
                    debug!("client disconnected");
                    break Ok(());
                }
                Err(e) => break Err(e),
            };

            debug!(?request, "received request");

            let (response, subscribe) = Self::process_request(request, &ctx).await;

            if subscribe && forwarder.is_none() {
                // Subscribe before answering so no event falls in between
                let event_rx = ctx.event_tx.subscribe();
                if let Err(e) = write_message(&mut *writer.lock().await, &response).await {
                    break Err(e);
                }
                forwarder = Some(tokio::spawn(forward_events(event_rx, Arc::clone(&writer))));
                debug!("client subscribed to notifications");
                continue;
            }

            if let Err(e) = write_message(&mut *writer.lock().await, &response).await {
                break Err(e);
            }
        };

        if let Some(forwarder) = forwarder {
            forwarder.abort();
        }
        result
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    async fn process_request(request: Request, ctx: &ClientContext) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => {
                let state = ctx.state.read().await;
                let mut status = state.status.clone();
                status.uptime_secs = state.start_time.elapsed().as_secs();
                (Response::Status(status), false)
            }

            Request::Subscribe => (Response::Subscribed, true),

            Request::Reload => {
                info!("reload requested via IPC");
                ctx.preferences.notify_changed();
                (Response::Reloading, false)
            }

            Request::UpdatePreferences(update) => {
                // File I/O stays off the runtime threads
                let preferences = Arc::clone(&ctx.preferences);
                let updated = tokio::task::spawn_blocking(move || preferences.update(&update))
                    .await
                    .map_err(anyhow::Error::from)
                    .and_then(|result| result.map_err(anyhow::Error::from));

                match updated {
                    Ok(prefs) => (
                        Response::PreferencesUpdated {
                            label_text: prefs.label_text,
                            enabled_indicators: prefs.enabled_indicators.into_iter().collect(),
                        },
                        false,
                    ),
                    Err(e) => {
                        error!(%e, "failed to update preferences");
                        (
                            Response::Error {
                                code: "preferences_update_failed".to_string(),
                                message: e.to_string(),
                            },
                            false,
                        )
                    }
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        self.status_task.abort();

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Keep the status snapshot in step with the daemon events
async fn track_status(
    mut event_rx: broadcast::Receiver<DaemonEvent>,
    state: Arc<RwLock<ServerState>>,
) {
    loop {
        match event_rx.recv().await {
            Ok(event) => {
                debug!(%event, "status updated");
                state.write().await.status.apply(&event);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "status tracker lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Push events to one subscribed client until it goes away
async fn forward_events(
    mut event_rx: broadcast::Receiver<DaemonEvent>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
) {
    loop {
        match event_rx.recv().await {
            Ok(event) => {
                let notification = Notification::Event { event };
                if let Err(e) = write_message(&mut *writer.lock().await, &notification).await {
                    debug!(?e, "subscriber went away");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
