//! Transaction log collaborator. One entry per successful pay, collect, or
//! transfer; fire-and-forget, never part of the success/failure contract.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::warn;
use serde::{Deserialize, Serialize};

/// Receives one notification per successful money movement.
pub trait TransactionLog: Send + Sync {
    /// `from`/`to` are account names; `None` marks the world side of a pure
    /// sink or faucet operation.
    fn log_transfer(&self, from: Option<&str>, amount: f64, to: Option<&str>, reason: &str);
}

/// One logged money movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferEntry {
    pub timestamp: DateTime<Utc>,
    pub from: Option<String>,
    pub amount: f64,
    pub to: Option<String>,
    pub reason: String,
}

/// Appends JSON lines to a money log file under an exclusive lock. Write
/// failures are warned about and dropped; the transfer already happened.
pub struct FileTransactionLog {
    path: PathBuf,
}

impl FileTransactionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.path)?;
        lock_file.lock_exclusive()?;

        // Rewrite through a temp file so a crash mid-append cannot truncate
        // older entries.
        let mut existing = String::new();
        let mut reader = &lock_file;
        let _ = reader.read_to_string(&mut existing);
        existing.push_str(line);
        existing.push('\n');

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let base = self
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("money.log");
        let mut counter = 0u32;
        let tmp_path = loop {
            let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut tmp) => {
                    tmp.write_all(existing.as_bytes())?;
                    tmp.flush()?;
                    let _ = tmp.sync_all();
                    break candidate;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                    continue;
                }
                Err(e) => return Err(e),
            }
        };
        std::fs::rename(&tmp_path, &self.path)?;
        drop(lock_file);
        Ok(())
    }

    /// Read back every entry, oldest first. Malformed lines are skipped.
    pub fn entries(&self) -> Vec<TransferEntry> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl TransactionLog for FileTransactionLog {
    fn log_transfer(&self, from: Option<&str>, amount: f64, to: Option<&str>, reason: &str) {
        let entry = TransferEntry {
            timestamp: Utc::now(),
            from: from.map(str::to_string),
            amount,
            to: to.map(str::to_string),
            reason: reason.to_string(),
        };
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                warn!("could not serialize transfer entry: {}", e);
                return;
            }
        };
        if let Err(e) = self.append(&line) {
            warn!("could not append to money log {}: {}", self.path.display(), e);
        }
    }
}

/// Collects entries in memory. Used by tests asserting on log traffic.
#[derive(Default)]
pub struct MemoryTransactionLog {
    entries: Mutex<Vec<TransferEntry>>,
}

impl MemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TransferEntry> {
        self.entries.lock().expect("log lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransactionLog for MemoryTransactionLog {
    fn log_transfer(&self, from: Option<&str>, amount: f64, to: Option<&str>, reason: &str) {
        self.entries
            .lock()
            .expect("log lock poisoned")
            .push(TransferEntry {
                timestamp: Utc::now(),
                from: from.map(str::to_string),
                amount,
                to: to.map(str::to_string),
                reason: reason.to_string(),
            });
    }
}
