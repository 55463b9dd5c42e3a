/// Local filesystem storage backend.
///
/// Board files are read and written whole, with the codec picked from the
/// file extension. Writes are atomic (write to .tmp, fsync, rename) and
/// register a fingerprint so the watcher can drop the echo of our own write.
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{BoardStorage, StorageError};
use crate::codec::{self, BoardFormat};
use crate::types::Board;
use crate::watcher::self_write::SelfWriteTracker;

/// Local filesystem board storage.
#[derive(Debug, Default)]
pub struct LocalStorage {
    self_writes: Mutex<SelfWriteTracker>,
}

impl LocalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop self-write fingerprints that were never echoed back.
    pub fn prune_fingerprints(&self) {
        self.tracker().prune();
    }

    fn tracker(&self) -> MutexGuard<'_, SelfWriteTracker> {
        self.self_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        // Non-empty-to-empty protection
        if content.trim().is_empty() {
            if let Ok(existing) = fs::read_to_string(path) {
                if !existing.trim().is_empty() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "Refusing to overwrite non-empty file with empty content",
                    ));
                }
            }
        }

        let tmp_path = path.with_extension("taskboard.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // fsync directory for rename durability
        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl BoardStorage for LocalStorage {
    fn read_board(&self, path: &Path) -> Result<Board, StorageError> {
        let format = BoardFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        Ok(codec::decode(format, &content)?)
    }

    fn write_board(&self, path: &Path, board: &Board) -> Result<(), StorageError> {
        let format = BoardFormat::from_path(path)?;
        let content = codec::encode(format, board)?;

        self.tracker().register(path, &content);
        if let Err(e) = Self::atomic_write(path, &content) {
            // Nothing landed on disk, so nothing will echo back.
            self.tracker().take_match(path, &content);
            log::error!("[taskboard.storage.write] Failed to write {:?}: {}", path, e);
            return Err(e.into());
        }
        log::debug!("[taskboard.storage.write] Wrote {:?} ({} bytes)", path, content.len());
        Ok(())
    }

    fn is_self_write(&self, path: &Path) -> bool {
        match fs::read_to_string(path) {
            Ok(content) => self.tracker().take_match(path, &content),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoardError;
    use crate::types::Status;
    use tempfile::TempDir;

    #[test]
    fn test_create_then_read_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let storage = LocalStorage::new();

        let created = storage.create_board(&path).unwrap();
        assert_eq!(created, Board::default());
        assert_eq!(storage.read_board(&path).unwrap(), Board::default());
        assert!(!dir.path().join("board.taskboard.tmp").exists());
    }

    #[test]
    fn test_csv_write_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.csv");
        let storage = LocalStorage::new();

        std::fs::write(
            &path,
            "id,title,description,status,createdAt,updatedAt\n,Fix bug,,done,a,b\n",
        )
        .unwrap();
        let board = storage.read_board(&path).unwrap();
        assert_eq!(board.column(Status::Done).unwrap().tickets[0].title, "Fix bug");

        storage.write_board(&path, &board).unwrap();
        let again = storage.read_board(&path).unwrap();
        assert_eq!(again, board);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.md");
        let storage = LocalStorage::new();
        let err = storage.write_board(&path, &Board::default()).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Board(BoardError::UnsupportedFormat(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();
        let err = storage.read_board(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn test_self_write_detected_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let storage = LocalStorage::new();

        storage.write_board(&path, &Board::default()).unwrap();
        assert!(storage.is_self_write(&path));
        assert!(!storage.is_self_write(&path));
    }

    #[test]
    fn test_external_edit_not_self_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let storage = LocalStorage::new();

        storage.write_board(&path, &Board::default()).unwrap();
        std::fs::write(&path, "{\"columns\": []}").unwrap();
        assert!(!storage.is_self_write(&path));
    }

    #[test]
    fn test_refuses_empty_over_non_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.csv");
        std::fs::write(&path, "something").unwrap();
        let err = LocalStorage::atomic_write(&path, "  \n").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "something");
    }
}
