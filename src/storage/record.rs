//! File records
//!
//! Metadata for one stored file. The bytes themselves live in a `ByteStore`.

use chrono::{DateTime, DurationRound, Local, TimeDelta};
use std::sync::Arc;

use crate::auth::User;
use crate::storage::guard::{ModificationGuard, ModificationState};
use crate::storage::permissions::Permissions;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Current local time truncated to the minute.
pub fn minute_now() -> DateTime<Local> {
    let now = Local::now();
    now.duration_trunc(TimeDelta::minutes(1)).unwrap_or(now)
}

/// One registry entry. Clones share the modification guard of the original.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub filename: String,
    pub owner: String,
    pub group: String,
    pub permissions: Permissions,
    pub size: u64,
    pub last_modified: DateTime<Local>,
    guard: Arc<ModificationGuard>,
}

impl FileRecord {
    /// New empty, idle record owned by `user`.
    pub fn new(filename: &str, user: &User, permissions: Permissions) -> Self {
        Self {
            filename: filename.to_string(),
            owner: user.name.clone(),
            group: user.group.clone(),
            permissions,
            size: 0,
            last_modified: minute_now(),
            guard: Arc::new(ModificationGuard::new()),
        }
    }

    pub fn modification_state(&self) -> ModificationState {
        self.guard.state()
    }

    pub fn is_modifying(&self) -> bool {
        self.guard.is_modifying()
    }

    pub(crate) fn guard(&self) -> &Arc<ModificationGuard> {
        &self.guard
    }
}
