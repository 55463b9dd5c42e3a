/// File watcher using notify-debouncer-full.
///
/// Watches board files (through their parent directories) and emits
/// BoardFileEvent via broadcast channel. 500ms debounce window so editors
/// that save in several steps produce one event.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_full::{new_debouncer, DebouncedEvent, Debouncer, RecommendedCache};
use tokio::sync::broadcast;

use super::types::BoardFileEvent;

const DEBOUNCE_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct WatchSet {
    /// board files we report on
    files: HashSet<PathBuf>,
    /// watched parent directories (to avoid duplicate watches)
    watched_dirs: HashSet<PathBuf>,
}

/// File watcher that monitors board files for changes.
pub struct FileWatcher {
    debouncer: Debouncer<notify::RecommendedWatcher, RecommendedCache>,
    watch_set: Arc<RwLock<WatchSet>>,
}

impl FileWatcher {
    /// Create a new file watcher.
    /// Returns the watcher and a broadcast receiver for events.
    pub fn new() -> Result<(Self, broadcast::Receiver<BoardFileEvent>), notify::Error> {
        let (event_tx, event_rx) = broadcast::channel(256);
        let watch_set = Arc::new(RwLock::new(WatchSet::default()));

        let set_clone = watch_set.clone();

        let debouncer = new_debouncer(
            DEBOUNCE_DURATION,
            None,
            move |result: Result<Vec<DebouncedEvent>, Vec<notify::Error>>| match result {
                Ok(events) => {
                    for event in events {
                        handle_debounced_event(&event, &set_clone, &event_tx);
                    }
                }
                Err(errors) => {
                    for e in errors {
                        log::error!("[taskboard.watcher.error] Watch error: {}", e);
                    }
                }
            },
        )?;

        Ok((
            Self {
                debouncer,
                watch_set,
            },
            event_rx,
        ))
    }

    /// Start watching a board file.
    pub fn watch(&mut self, path: &Path) -> Result<(), notify::Error> {
        let canonical = canonical_path(path);
        self.watch_set
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .files
            .insert(canonical.clone());

        self.ensure_watched(&canonical)?;
        log::info!("[taskboard.watcher.board] Watching {:?}", canonical);
        Ok(())
    }

    /// Stop reporting on a board file.
    pub fn unwatch(&mut self, path: &Path) {
        let canonical = canonical_path(path);
        self.watch_set
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .files
            .remove(&canonical);
        // Parent directories stay watched; events for untracked paths are ignored.
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.watch_set
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .files
            .contains(&canonical_path(path))
    }

    /// Ensure the parent directory of a file is being watched.
    fn ensure_watched(&mut self, file_path: &Path) -> Result<(), notify::Error> {
        if let Some(parent) = file_path.parent() {
            let mut set = self.watch_set.write().unwrap_or_else(PoisonError::into_inner);
            if set.watched_dirs.contains(parent) {
                return Ok(());
            }
            set.watched_dirs.insert(parent.to_path_buf());
            drop(set);

            self.debouncer.watch(parent, RecursiveMode::NonRecursive)?;
        }
        Ok(())
    }
}

/// Resolve symlinks where possible so event paths and watched paths compare equal.
/// A file that does not exist yet is resolved through its parent directory.
fn canonical_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => std::fs::canonicalize(parent)
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// Handle a single debounced event.
fn handle_debounced_event(
    event: &DebouncedEvent,
    watch_set: &Arc<RwLock<WatchSet>>,
    tx: &broadcast::Sender<BoardFileEvent>,
) {
    use notify::EventKind;

    for path in &event.paths {
        let canonical = canonical_path(path);
        let tracked = watch_set
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .files
            .contains(&canonical);
        if !tracked {
            continue;
        }

        let file_event = match event.kind {
            EventKind::Remove(_) => BoardFileEvent::Removed { path: canonical },
            EventKind::Create(_) => BoardFileEvent::Created { path: canonical },
            EventKind::Access(_) => continue,
            _ => BoardFileEvent::Changed { path: canonical },
        };

        if let Err(e) = tx.send(file_event) {
            log::warn!("[taskboard.watcher.send] No receivers: {}", e);
        }
    }
}
