//! Audit logging middleware
//!
//! Records one line per completed command:
//! `[timestamp] user=<name> action=<op> file=<name> status=<outcome>`.

use chrono::Local;
use log::{error, info};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const AUDIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only sink for command outcomes. Recording never fails the command.
pub trait AuditSink: Send + Sync {
    fn record(&self, user: &str, action: &str, file: &str, outcome: &str);
}

/// A single recorded outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub user: String,
    pub action: String,
    pub file: String,
    pub outcome: String,
}

impl AuditEntry {
    fn new(user: &str, action: &str, file: &str, outcome: &str) -> Self {
        let file = if file.is_empty() { "-" } else { file };
        Self {
            user: user.to_string(),
            action: action.to_string(),
            file: file.to_string(),
            outcome: outcome.to_string(),
        }
    }

    /// Format as an audit log line without the trailing newline
    pub fn to_line(&self, timestamp: &str) -> String {
        format!(
            "[{}] user={} action={} file={} status={}",
            timestamp, self.user, self.action, self.file, self.outcome
        )
    }
}

/// Appends audit lines to a file.
pub struct FileAuditLog {
    file: Mutex<File>,
}

impl FileAuditLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!("Audit log: {}", path.display());
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditLog {
    fn record(&self, user: &str, action: &str, file: &str, outcome: &str) {
        let stamp = Local::now().format(AUDIT_TIMESTAMP_FORMAT).to_string();
        let line = AuditEntry::new(user, action, file, outcome).to_line(&stamp);

        let mut log_file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(log_file, "{line}").and_then(|_| log_file.flush()) {
            error!("Failed to write audit entry ({line}): {e}");
        }
    }
}

/// Keeps audit entries in memory.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, user: &str, action: &str, file: &str, outcome: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AuditEntry::new(user, action, file, outcome));
    }
}
