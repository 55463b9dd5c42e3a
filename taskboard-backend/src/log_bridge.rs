/// Logger for the board host: env_logger filtering, with every accepted
/// record kept in a bounded in-memory ring (served at /logs) and appended
/// to ~/.config/taskboard/logs/backend.log.
use env_logger::{Logger, Target};
use log::{Log, Metadata, Record, SetLoggerError};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};

const MAX_LOG_ENTRIES: usize = 1000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp_ms: u64,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    fn now(level: &str, target: &str, message: String) -> Self {
        Self {
            timestamp_ms: std::time::SystemTime::now()
                .duration_since(std::time::SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            level: level.to_string(),
            target: target.to_string(),
            message,
        }
    }
}

#[derive(Default)]
struct LogRing {
    entries: Mutex<VecDeque<LogEntry>>,
}

impl LogRing {
    fn push(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push_back(entry);
            while entries.len() > MAX_LOG_ENTRIES {
                entries.pop_front();
            }
        }
    }

    fn recent_entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }
}

static LOG_RING: LazyLock<LogRing> = LazyLock::new(LogRing::default);

struct LogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl LogFile {
    fn new() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskboard")
            .join("logs")
            .join("backend.log");
        let file = Self::open(&path).ok();
        Self {
            path,
            file: Mutex::new(file),
        }
    }

    fn open(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn append_entry(&self, entry: &LogEntry) {
        let Ok(mut guard) = self.file.lock() else {
            return;
        };
        if guard.is_none() {
            match Self::open(&self.path) {
                Ok(file) => *guard = Some(file),
                Err(_) => return,
            }
        }
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{}", format_log_line(entry));
            let _ = file.flush();
        }
    }
}

static LOG_FILE: LazyLock<LogFile> = LazyLock::new(LogFile::new);

fn format_log_line(entry: &LogEntry) -> String {
    format!(
        "{} [{}] [{}] {}",
        entry.timestamp_ms,
        entry.level.to_uppercase(),
        entry.target,
        entry.message.replace('\n', "\\n")
    )
}

struct RingLogger {
    inner: Logger,
}

impl Log for RingLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Keep stderr output as well; the ring and file are extra sinks.
        self.inner.log(record);

        let entry = LogEntry::now(
            &record.level().to_string().to_lowercase(),
            record.target(),
            record.args().to_string(),
        );
        LOG_RING.push(entry.clone());
        LOG_FILE.append_entry(&entry);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the logger. Filter comes from RUST_LOG, default `info`.
pub fn init() -> Result<(), SetLoggerError> {
    let _ = &*LOG_FILE;
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.target(Target::Stderr);
    let inner = builder.build();
    let max_level = inner.filter();
    let logger = Box::leak(Box::new(RingLogger { inner }));
    log::set_logger(logger)?;
    log::set_max_level(max_level);
    Ok(())
}

pub fn recent_entries() -> Vec<LogEntry> {
    LOG_RING.recent_entries()
}

pub fn log_file_path() -> String {
    LOG_FILE.path.display().to_string()
}

/// Record a line when the logger itself could not be installed.
pub fn write_fallback_line(message: &str) {
    let entry = LogEntry::now("error", "taskboard.log_bridge", message.to_string());
    LOG_RING.push(entry.clone());
    LOG_FILE.append_entry(&entry);
}
