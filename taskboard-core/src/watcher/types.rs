/// Event types emitted by the file watcher.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Something happened to a watched board file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BoardFileEvent {
    Changed {
        #[serde(serialize_with = "serialize_path", deserialize_with = "deserialize_path")]
        path: PathBuf,
    },
    Created {
        #[serde(serialize_with = "serialize_path", deserialize_with = "deserialize_path")]
        path: PathBuf,
    },
    Removed {
        #[serde(serialize_with = "serialize_path", deserialize_with = "deserialize_path")]
        path: PathBuf,
    },
}

impl BoardFileEvent {
    pub fn path(&self) -> &Path {
        match self {
            BoardFileEvent::Changed { path }
            | BoardFileEvent::Created { path }
            | BoardFileEvent::Removed { path } => path,
        }
    }
}

fn serialize_path<S: serde::Serializer>(path: &Path, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&path.to_string_lossy())
}

fn deserialize_path<'de, D: serde::Deserializer<'de>>(d: D) -> Result<PathBuf, D::Error> {
    let s = String::deserialize(d)?;
    Ok(PathBuf::from(s))
}
