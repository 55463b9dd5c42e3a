/// Echo suppression for our own board writes.
///
/// Every write registers a SHA-256 fingerprint of the bytes it puts on disk.
/// When the watcher reports a change, the file is re-read and fingerprinted:
/// a pending match means the event is the echo of that write and is dropped;
/// anything else is an external edit. Entries older than the TTL are pruned
/// by `prune`, which is housekeeping only.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

const FINGERPRINT_TTL: Duration = Duration::from_secs(10);

/// SHA-256 of content with `\r\n` folded to `\n`.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.replace("\r\n", "\n").as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Default)]
pub struct SelfWriteTracker {
    /// path -> (fingerprint, registered at); several writes may be in flight
    pending: HashMap<PathBuf, Vec<(String, Instant)>>,
}

impl SelfWriteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call right before writing `content` to `path`.
    pub fn register(&mut self, path: &Path, content: &str) {
        self.pending
            .entry(path.to_path_buf())
            .or_default()
            .push((fingerprint(content), Instant::now()));
    }

    /// Consume a pending fingerprint matching `content`. True means "ours".
    pub fn take_match(&mut self, path: &Path, content: &str) -> bool {
        let wanted = fingerprint(content);
        let Some(entries) = self.pending.get_mut(path) else {
            return false;
        };
        let Some(index) = entries.iter().position(|(fp, _)| *fp == wanted) else {
            return false;
        };
        entries.remove(index);
        if entries.is_empty() {
            self.pending.remove(path);
        }
        true
    }

    pub fn prune(&mut self) {
        let now = Instant::now();
        self.pending.retain(|_, entries| {
            entries.retain(|(_, at)| now.duration_since(*at) < FINGERPRINT_TTL);
            !entries.is_empty()
        });
    }

    pub fn pending_count(&self, path: &Path) -> usize {
        self.pending.get(path).map_or(0, Vec::len)
    }
}
