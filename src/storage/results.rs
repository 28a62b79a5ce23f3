//! Storage result types
//!
//! Defines result structures returned by registry operations.

use chrono::{DateTime, Local};

use crate::storage::record::TIMESTAMP_FORMAT;

/// One line of a listing: a read-only snapshot, never a live handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub filename: String,
    pub permissions: String,
}

/// Result of a committed write
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub filename: String,
    pub size: u64,
    pub last_modified: DateTime<Local>,
    /// Bytes of the payload that were actually stored
    pub written: usize,
}

impl WriteOutcome {
    pub fn summary(&self) -> String {
        format!(
            "size={} modified={}",
            self.size,
            self.last_modified.format(TIMESTAMP_FORMAT)
        )
    }
}
