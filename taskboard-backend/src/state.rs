/// Shared application state passed to axum handlers, and the host-side
/// operations on the open board.
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use taskboard_core::config::WorkspaceState;
use taskboard_core::protocol::{HostMessage, ViewMessage};
use taskboard_core::session::BoardSession;
use taskboard_core::storage::local::LocalStorage;
use taskboard_core::storage::{BoardStorage, StorageError};
use taskboard_core::watcher::file_watcher::FileWatcher;
use taskboard_core::watcher::types::BoardFileEvent;
use tokio::sync::broadcast;

use crate::config::save_workspace;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("No board is open")]
    NoBoard,

    #[error("Board file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<LocalStorage>,
    pub session: Arc<tokio::sync::Mutex<Option<BoardSession>>>,
    /// Fan-out of host messages to SSE clients.
    pub host_tx: broadcast::Sender<HostMessage>,
    pub watcher: Arc<Mutex<Option<FileWatcher>>>,
    pub workspace: Arc<Mutex<WorkspaceState>>,
    pub workspace_path: PathBuf,
    pub port: u16,
    pub bind_address: String,
}

impl AppState {
    pub fn new(
        port: u16,
        bind_address: String,
        workspace: WorkspaceState,
        workspace_path: PathBuf,
    ) -> Self {
        let (host_tx, _) = broadcast::channel(256);
        Self {
            storage: Arc::new(LocalStorage::new()),
            session: Arc::new(tokio::sync::Mutex::new(None)),
            host_tx,
            watcher: Arc::new(Mutex::new(None)),
            workspace: Arc::new(Mutex::new(workspace)),
            workspace_path,
            port,
            bind_address,
        }
    }

    /// Send to every connected view. Having no listeners is fine.
    pub fn broadcast(&self, message: HostMessage) {
        let _ = self.host_tx.send(message);
    }

    pub fn workspace_snapshot(&self) -> WorkspaceState {
        self.workspace
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change the stored preferences and persist them.
    pub fn update_workspace(&self, change: impl FnOnce(&mut WorkspaceState)) -> WorkspaceState {
        let snapshot = {
            let mut workspace = self.workspace.lock().unwrap_or_else(PoisonError::into_inner);
            change(&mut workspace);
            workspace.clone()
        };
        if let Err(e) = save_workspace(&self.workspace_path, &snapshot) {
            log::warn!(
                "[taskboard.prefs] Failed to save {}: {}",
                self.workspace_path.display(),
                e
            );
        }
        snapshot
    }

    /// Open an existing board file and make it the current board.
    pub async fn open_board(&self, path: &Path) -> Result<HostMessage, HostError> {
        let canonical = std::fs::canonicalize(path).map_err(StorageError::from)?;
        let session = BoardSession::open(self.dyn_storage(), &canonical)?;
        Ok(self.install(session).await)
    }

    /// Create a new board file and make it the current board.
    pub async fn create_board(&self, path: &Path) -> Result<HostMessage, HostError> {
        if path.exists() {
            return Err(HostError::AlreadyExists(path.to_path_buf()));
        }
        let resolved = resolve_new_file(path).map_err(StorageError::from)?;
        let session = BoardSession::create(self.dyn_storage(), &resolved)?;
        Ok(self.install(session).await)
    }

    /// Handle one message from a view. Returns the reply for that view;
    /// board changes are also broadcast to every view.
    pub async fn handle_view_message(&self, message: ViewMessage) -> Result<HostMessage, HostError> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(HostError::NoBoard)?;

        let changed = match message {
            ViewMessage::RequestBoardData => false,
            ViewMessage::BoardUpdated { board } => session.replace(board)?,
            ViewMessage::Intent { intent } => session.apply(&intent)?,
        };

        let reply = session.board_message();
        if changed {
            log::debug!(
                "[taskboard.host] Board {:?} now at version {}",
                session.path(),
                session.version()
            );
            self.broadcast(reply.clone());
        }
        Ok(reply)
    }

    /// React to a watcher event for the open board.
    pub async fn handle_file_event(&self, event: &BoardFileEvent) {
        self.storage.prune_fingerprints();

        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut() else {
            return;
        };
        if event.path() != session.path() {
            return;
        }

        match event {
            BoardFileEvent::Removed { path } => {
                log::warn!("[taskboard.events] Board file removed: {:?}", path);
                self.broadcast(HostMessage::error(format!(
                    "Board file was removed: {}",
                    path.display()
                )));
            }
            BoardFileEvent::Changed { path } | BoardFileEvent::Created { path } => {
                match session.handle_external_change(path) {
                    Ok(true) => self.broadcast(session.board_message()),
                    Ok(false) => {}
                    Err(e) => {
                        log::warn!("[taskboard.events] Failed to reload {:?}: {}", path, e);
                        self.broadcast(HostMessage::error(e));
                    }
                }
            }
        }
    }

    fn dyn_storage(&self) -> Arc<dyn BoardStorage> {
        self.storage.clone()
    }

    /// Swap in a new session: move the watch, remember the file, tell the views.
    async fn install(&self, session: BoardSession) -> HostMessage {
        let file = session.file().clone();
        let message = session.board_message();

        let previous = self.session.lock().await.replace(session);
        {
            let mut watcher = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(watcher) = watcher.as_mut() {
                if let Some(old) = &previous {
                    watcher.unwatch(old.path());
                }
                if let Err(e) = watcher.watch(&file.path) {
                    log::warn!("[taskboard.watcher] Failed to watch {:?}: {}", file.path, e);
                }
            }
        }
        if let Some(old) = previous {
            old.dispose();
        }

        self.update_workspace(|w| w.record_opened(file));
        self.broadcast(message.clone());
        message
    }
}

/// Canonical form of a file that does not exist yet: the parent directory is
/// resolved so the path matches what the watcher reports.
fn resolve_new_file(path: &Path) -> std::io::Result<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    Ok(std::fs::canonicalize(parent)?.join(name))
}
