/// An open board file.
///
/// A `BoardSession` owns the last good board read from or written to one
/// file. Every mutation goes reconcile -> persist -> adopt: if the write
/// fails the session keeps the previous board, so what it holds always
/// matches something that was on disk. External edits are picked up whole
/// (last writer wins).
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec;
use crate::config::BoardFile;
use crate::protocol::HostMessage;
use crate::reconcile::{self, BoardIntent};
use crate::storage::{BoardStorage, StorageError};
use crate::types::Board;

pub struct BoardSession {
    storage: Arc<dyn BoardStorage>,
    file: BoardFile,
    board: Board,
    /// Monotonic version counter, incremented on every change
    version: u64,
}

impl std::fmt::Debug for BoardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardSession")
            .field("file", &self.file)
            .field("version", &self.version)
            .finish()
    }
}

impl BoardSession {
    /// Open an existing board file.
    pub fn open(storage: Arc<dyn BoardStorage>, path: &Path) -> Result<Self, StorageError> {
        let file = BoardFile::from_path(path)?;
        let board = storage.read_board(path)?;
        log::info!(
            "[taskboard.session.open] Opened {:?} ({} tickets)",
            path,
            board.tickets().count()
        );
        Ok(Self {
            storage,
            file,
            board,
            version: 1,
        })
    }

    /// Create a new board file with the three empty working columns.
    pub fn create(storage: Arc<dyn BoardStorage>, path: &Path) -> Result<Self, StorageError> {
        let file = BoardFile::from_path(path)?;
        let board = storage.create_board(path)?;
        log::info!("[taskboard.session.create] Created {:?}", path);
        Ok(Self {
            storage,
            file,
            board,
            version: 1,
        })
    }

    pub fn file(&self) -> &BoardFile {
        &self.file
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// The message a view needs to render the current state.
    pub fn board_message(&self) -> HostMessage {
        HostMessage::BoardData {
            board: self.board.clone(),
        }
    }

    /// Run one mutation and persist it. Returns whether the board changed.
    pub fn apply(&mut self, intent: &BoardIntent) -> Result<bool, StorageError> {
        let next = reconcile::apply(&self.board, intent)?;
        self.commit(next)
    }

    /// Persist a whole board sent by a view, repaired first. Returns whether
    /// it changed.
    pub fn replace(&mut self, board: Board) -> Result<bool, StorageError> {
        self.commit(codec::normalize(board))
    }

    /// Re-read the file. On failure the previous board is kept and the error
    /// is returned. Returns whether the board changed.
    pub fn reload(&mut self) -> Result<bool, StorageError> {
        let board = match self.storage.read_board(&self.file.path) {
            Ok(board) => board,
            Err(e) => {
                log::warn!(
                    "[taskboard.session.reload] Keeping last good board for {:?}: {}",
                    self.file.path,
                    e
                );
                return Err(e);
            }
        };
        Ok(self.adopt(board))
    }

    /// React to a watcher event for `path`. Our own writes and other files are
    /// ignored; anything else reloads. Returns whether the board changed.
    pub fn handle_external_change(&mut self, path: &Path) -> Result<bool, StorageError> {
        if path != self.file.path.as_path() {
            return Ok(false);
        }
        if self.storage.is_self_write(path) {
            log::debug!("[taskboard.session.watch] Ignoring own write to {:?}", path);
            return Ok(false);
        }
        log::info!("[taskboard.session.watch] External change to {:?}", path);
        self.reload()
    }

    /// Close the session and hand back the file it was bound to.
    pub fn dispose(self) -> PathBuf {
        log::info!("[taskboard.session.close] Closed {:?}", self.file.path);
        self.file.path
    }

    fn commit(&mut self, next: Board) -> Result<bool, StorageError> {
        if next == self.board {
            return Ok(false);
        }
        self.storage.write_board(&self.file.path, &next)?;
        Ok(self.adopt(next))
    }

    fn adopt(&mut self, board: Board) -> bool {
        if board == self.board {
            return false;
        }
        self.board = board;
        self.version += 1;
        true
    }
}
