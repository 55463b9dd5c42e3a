/// Workspace preferences shared by the backend and its views.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::BoardFormat;
use crate::error::BoardError;
use crate::types::Status;

/// How many recently opened files are remembered.
pub const MAX_RECENT_FILES: usize = 5;

/// A board file the user has opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardFile {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub format: BoardFormat,
    /// Display name, the file name by default.
    pub name: String,
}

impl BoardFile {
    pub fn from_path(path: &Path) -> Result<Self, BoardError> {
        let format = BoardFormat::from_path(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self {
            path: path.to_path_buf(),
            format,
            name,
        })
    }
}

/// Persisted user preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceState {
    #[serde(default)]
    pub last_opened_file: Option<BoardFile>,
    /// Most recent first, no duplicates.
    #[serde(default)]
    pub recent_files: Vec<BoardFile>,
    #[serde(default = "default_column_order")]
    pub column_order: Vec<Status>,
}

fn default_column_order() -> Vec<Status> {
    Status::WORKING.to_vec()
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self {
            last_opened_file: None,
            recent_files: Vec::new(),
            column_order: default_column_order(),
        }
    }
}

impl WorkspaceState {
    /// Remember `file` as the last opened board and move it to the front of
    /// the recent list.
    pub fn record_opened(&mut self, file: BoardFile) {
        self.recent_files.retain(|f| f.path != file.path);
        self.recent_files.insert(0, file.clone());
        self.recent_files.truncate(MAX_RECENT_FILES);
        self.last_opened_file = Some(file);
    }

    /// Replace the column order. The hidden column is never part of it and
    /// duplicates are dropped; an empty result falls back to the default.
    pub fn set_column_order(&mut self, order: &[Status]) {
        let mut cleaned: Vec<Status> = Vec::new();
        for status in order {
            if status.is_working() && !cleaned.contains(status) {
                cleaned.push(*status);
            }
        }
        self.column_order = if cleaned.is_empty() {
            default_column_order()
        } else {
            cleaned
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
