/// Board host: config loading, board session, file watching, HTTP server.
pub mod api;
pub mod config;
pub mod log_bridge;
pub mod server;
pub mod state;

use std::path::PathBuf;

use taskboard_core::watcher::file_watcher::FileWatcher;
use taskboard_core::watcher::types::BoardFileEvent;
use tokio::sync::{broadcast, watch};

use crate::state::AppState;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = log_bridge::init() {
        log_bridge::write_fallback_line(&format!("failed to initialize backend logger: {}", e));
    }

    let config_path = config::default_config_path();
    let config = config::load_config(&config_path);
    let workspace_path = config::default_workspace_path();
    let workspace = config::load_workspace(&workspace_path);
    let last_opened = workspace.last_opened_file.clone();

    let state = AppState::new(
        config.port,
        config.bind_address.clone(),
        workspace,
        workspace_path,
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    match FileWatcher::new() {
        Ok((watcher, watcher_rx)) => {
            if let Ok(mut slot) = state.watcher.lock() {
                *slot = Some(watcher);
            }
            spawn_event_loop(state.clone(), watcher_rx, shutdown_rx.clone());
        }
        Err(e) => log::warn!("[taskboard.watcher] Failed to create file watcher: {}", e),
    }

    if let Some(file) = last_opened {
        reopen_last(&state, file.path).await;
    }

    let port = server::spawn_server(state, shutdown_rx).await?;
    log::info!("Server started on port {}", port);

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    let _ = shutdown_tx.send(true);
    Ok(())
}

async fn reopen_last(state: &AppState, path: PathBuf) {
    if !path.exists() {
        log::info!("[taskboard.host] Last board {:?} no longer exists", path);
        return;
    }
    match state.open_board(&path).await {
        Ok(_) => log::info!("[taskboard.host] Reopened {:?}", path),
        Err(e) => log::warn!("[taskboard.host] Failed to reopen {:?}: {}", path, e),
    }
}

/// Feed watcher events into the open session until shutdown.
fn spawn_event_loop(
    state: AppState,
    mut event_rx: broadcast::Receiver<BoardFileEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                result = event_rx.recv() => {
                    match result {
                        Ok(event) => state.handle_file_event(&event).await,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            log::warn!("[taskboard.events] Lagged by {} events", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            log::info!("[taskboard.events] Event channel closed");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    log::info!("[taskboard.events] Shutdown signal received");
                    break;
                }
            }
        }
    });
}
