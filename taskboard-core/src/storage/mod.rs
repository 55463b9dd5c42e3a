pub mod local;

use std::path::Path;

use crate::error::BoardError;
use crate::types::Board;

/// File access for board documents. The codec is picked from the path.
/// Implementations: LocalStorage (filesystem).
pub trait BoardStorage: Send + Sync {
    /// Read and decode a board file.
    fn read_board(&self, path: &Path) -> Result<Board, StorageError>;

    /// Encode and write a full board.
    fn write_board(&self, path: &Path, board: &Board) -> Result<(), StorageError>;

    /// Write a fresh three-column board and return it.
    fn create_board(&self, path: &Path) -> Result<Board, StorageError> {
        let board = Board::default();
        self.write_board(path, &board)?;
        Ok(board)
    }

    /// Whether the current content of `path` is one of our own writes.
    /// A match is consumed, so each write is suppressed at most once.
    fn is_self_write(&self, path: &Path) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Board(#[from] BoardError),
}
