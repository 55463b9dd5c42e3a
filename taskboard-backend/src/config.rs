/// Configuration for the board host.
/// Reads config.json and workspace.json from ~/.config/taskboard/ (or platform equivalent).
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use taskboard_core::config::WorkspaceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
}

/// Default config path: ~/.config/taskboard/config.json
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Default preferences path: ~/.config/taskboard/workspace.json
pub fn default_workspace_path() -> PathBuf {
    config_dir().join("workspace.json")
}

/// Load config from path. Returns default if file doesn't exist.
pub fn load_config(path: &Path) -> BackendConfig {
    load_or_default(path, "config")
}

/// Load saved preferences. Returns default if file doesn't exist.
pub fn load_workspace(path: &Path) -> WorkspaceState {
    load_or_default(path, "workspace")
}

pub fn save_workspace(path: &Path, workspace: &WorkspaceState) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(workspace)?;
    fs::write(path, content)?;
    Ok(())
}

fn load_or_default<T: Default + for<'de> Deserialize<'de>>(path: &Path, what: &str) -> T {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse {} {}: {}", what, path.display(), e);
            T::default()
        }),
        Err(_) => {
            log::info!("No {} at {}, using defaults", what, path.display());
            T::default()
        }
    }
}
