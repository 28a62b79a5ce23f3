//! Per-file modification guard
//!
//! Each record carries a guard with two states, `Idle` and `Modifying`.
//! `begin` moves Idle to Modifying with a compare-and-swap and hands back a
//! ticket; dropping the ticket moves the guard back to Idle. Nothing waits on
//! the guard: a second `begin` while Modifying fails with `Busy`.
//!
//! The guard also owns the content lock that serializes byte-level reads and
//! commits on the file, so a reader that passed the Idle check never sees a
//! commit land halfway through its read.

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationState {
    Idle,
    Modifying,
}

#[derive(Debug, Default)]
pub struct ModificationGuard {
    modifying: AtomicBool,
    content: Mutex<()>,
}

impl ModificationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ModificationState {
        if self.modifying.load(Ordering::Acquire) {
            ModificationState::Modifying
        } else {
            ModificationState::Idle
        }
    }

    pub fn is_modifying(&self) -> bool {
        self.state() == ModificationState::Modifying
    }

    /// Enters `Modifying`, or fails with `Busy` if another writer holds the file.
    pub fn begin(self: &Arc<Self>, filename: &str) -> Result<ModificationTicket, StorageError> {
        self.modifying
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| StorageError::Busy(filename.to_string()))?;

        debug!("Guard for {filename} entered Modifying");
        Ok(ModificationTicket {
            guard: Arc::clone(self),
            filename: filename.to_string(),
        })
    }

    fn end(&self, filename: &str) {
        self.modifying.store(false, Ordering::Release);
        debug!("Guard for {filename} returned to Idle");
    }

    /// Locks the file content for a byte-level read or commit.
    pub(crate) fn lock_content(&self) -> MutexGuard<'_, ()> {
        self.content.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of a successful `begin`. Ends the modification exactly once when dropped.
#[derive(Debug)]
pub struct ModificationTicket {
    guard: Arc<ModificationGuard>,
    filename: String,
}

impl ModificationTicket {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub(crate) fn guard(&self) -> &ModificationGuard {
        &self.guard
    }
}

impl Drop for ModificationTicket {
    fn drop(&mut self) {
        self.guard.end(&self.filename);
    }
}
