//! File registry
//!
//! The single owner of every `FileRecord`. All structural state sits behind
//! one mutex; critical sections touch memory and, for `create`, a bounded
//! local file creation. Network I/O never happens while the lock is held.

use chrono::{DateTime, Local};
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth::User;
use crate::error::StorageError;
use crate::storage::backend::ByteStore;
use crate::storage::guard::ModificationTicket;
use crate::storage::permissions::{self, Permissions};
use crate::storage::record::{FileRecord, minute_now};
use crate::storage::results::{FileEntry, WriteOutcome};
use crate::storage::validation::validate_filename;

/// How a write payload is applied to the existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Overwrite,
    Append,
}

/// An in-flight write. Holds the file in `Modifying` until committed or dropped.
#[derive(Debug)]
pub struct WriteTransaction {
    ticket: ModificationTicket,
}

impl WriteTransaction {
    pub fn filename(&self) -> &str {
        self.ticket.filename()
    }
}

/// Cuts `bytes` to at most `max_len`, backing off a character split at the cut.
fn truncate_content(bytes: &mut Vec<u8>, max_len: usize) {
    if bytes.len() <= max_len {
        return;
    }
    bytes.truncate(max_len);
    if let Err(e) = std::str::from_utf8(bytes) {
        // `error_len() == None` means the text ends in an incomplete sequence.
        if e.error_len().is_none() {
            bytes.truncate(e.valid_up_to());
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    records: Vec<FileRecord>,
    index: HashMap<String, usize>,
}

impl RegistryInner {
    fn get(&self, filename: &str) -> Option<&FileRecord> {
        let i = *self.index.get(filename)?;
        self.records.get(i)
    }

    fn get_mut(&mut self, filename: &str) -> Option<&mut FileRecord> {
        let i = *self.index.get(filename)?;
        self.records.get_mut(i)
    }
}

pub struct FileRegistry {
    inner: Mutex<RegistryInner>,
    store: Arc<dyn ByteStore>,
    max_files: usize,
}

impl FileRegistry {
    pub fn new(store: Arc<dyn ByteStore>, max_files: usize) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            store,
            max_files,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates an empty file owned by `user`.
    ///
    /// The uniqueness check, the capacity check, the backing file creation and
    /// the insertion happen under one lock, so a record is either fully there
    /// or not there at all.
    pub fn create(
        &self,
        user: &User,
        filename: &str,
        permissions: Permissions,
    ) -> Result<FileRecord, StorageError> {
        validate_filename(filename)?;

        let mut inner = self.lock();
        if inner.index.contains_key(filename) {
            return Err(StorageError::AlreadyExists(filename.to_string()));
        }
        if inner.records.len() >= self.max_files {
            return Err(StorageError::CapacityExceeded(self.max_files));
        }

        if let Err(e) = self.store.create_empty(filename) {
            error!("Failed to create backing file for {filename}: {e}");
            return Err(StorageError::BackingStore(e));
        }

        let record = FileRecord::new(filename, user, permissions);
        let position = inner.records.len();
        inner.records.push(record.clone());
        inner.index.insert(filename.to_string(), position);

        info!(
            "Created {} for {} with {} ({}/{} files)",
            filename,
            user,
            permissions,
            inner.records.len(),
            self.max_files
        );
        Ok(record)
    }

    /// Files visible to `user`, in creation order.
    pub fn list(&self, user: &User) -> Vec<FileEntry> {
        self.lock()
            .records
            .iter()
            .filter(|record| permissions::is_listable(record, user))
            .map(|record| FileEntry {
                filename: record.filename.clone(),
                permissions: record.permissions.to_string(),
            })
            .collect()
    }

    /// Snapshot of a record.
    pub fn lookup(&self, filename: &str) -> Option<FileRecord> {
        self.lock().get(filename).cloned()
    }

    fn require(&self, filename: &str) -> Result<FileRecord, StorageError> {
        self.lookup(filename)
            .ok_or_else(|| StorageError::NotFound(filename.to_string()))
    }

    /// Replaces the permission string. Only the owner may do this.
    pub fn update_permissions(
        &self,
        user: &User,
        filename: &str,
        permissions: Permissions,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock();
        let record = inner
            .get_mut(filename)
            .ok_or_else(|| StorageError::NotFound(filename.to_string()))?;

        if !permissions::can_change_mode(record, user) {
            return Err(StorageError::PermissionDenied(format!(
                "{user} does not own {filename}"
            )));
        }

        record.permissions = permissions;
        info!("Permissions of {filename} set to {permissions} by {user}");
        Ok(())
    }

    /// Refreshes size and timestamp after a byte-level write.
    pub fn record_write_outcome(
        &self,
        filename: &str,
        new_size: u64,
        timestamp: DateTime<Local>,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock();
        let record = inner
            .get_mut(filename)
            .ok_or_else(|| StorageError::NotFound(filename.to_string()))?;
        record.size = new_size;
        record.last_modified = timestamp;
        Ok(())
    }

    /// Reads at most `max_len` bytes of a file.
    ///
    /// Refused with `Busy` while a write is in flight; the reader never enters
    /// `Modifying` itself.
    pub fn read(
        &self,
        user: &User,
        filename: &str,
        max_len: usize,
    ) -> Result<Vec<u8>, StorageError> {
        let record = self.require(filename)?;
        if record.is_modifying() {
            return Err(StorageError::Busy(filename.to_string()));
        }
        if !permissions::can_read(&record, user) {
            return Err(StorageError::PermissionDenied(format!(
                "{user} cannot read {filename}"
            )));
        }

        let guard = record.guard();
        let _content = guard.lock_content();
        // A writer may have begun after the first check.
        if guard.is_modifying() {
            return Err(StorageError::Busy(filename.to_string()));
        }
        let mut bytes = self.store.read_all(filename).map_err(|e| {
            error!("Failed to read {filename}: {e}");
            StorageError::BackingStore(e)
        })?;
        truncate_content(&mut bytes, max_len);
        Ok(bytes)
    }

    /// First half of a write: checks existence, the guard and write access,
    /// then moves the file to `Modifying`.
    pub fn begin_write(&self, user: &User, filename: &str) -> Result<WriteTransaction, StorageError> {
        let record = self.require(filename)?;
        if record.is_modifying() {
            return Err(StorageError::Busy(filename.to_string()));
        }
        if !permissions::can_write(&record, user) {
            return Err(StorageError::PermissionDenied(format!(
                "{user} cannot write {filename}"
            )));
        }

        let ticket = record.guard().begin(filename)?;
        debug!("{user} began writing {filename}");
        Ok(WriteTransaction { ticket })
    }

    /// Content shown to the writer before it sends its payload.
    pub fn current_content(
        &self,
        transaction: &WriteTransaction,
        max_len: usize,
    ) -> Result<Vec<u8>, StorageError> {
        let filename = transaction.filename();
        let _content = transaction.ticket.guard().lock_content();
        let mut bytes = self.store.read_all(filename).map_err(|e| {
            error!("Failed to fetch current content of {filename}: {e}");
            StorageError::BackingStore(e)
        })?;
        truncate_content(&mut bytes, max_len);
        Ok(bytes)
    }

    /// Second half of a write: applies the payload and returns the file to `Idle`.
    pub fn commit_write(
        &self,
        transaction: WriteTransaction,
        mode: WriteMode,
        payload: &[u8],
    ) -> Result<WriteOutcome, StorageError> {
        let filename = transaction.filename().to_string();
        let outcome = {
            let _content = transaction.ticket.guard().lock_content();

            let applied = match mode {
                WriteMode::Overwrite => self.store.overwrite(&filename, payload),
                WriteMode::Append => self.store.append(&filename, payload),
            };
            let size = applied.and_then(|_| self.store.stat_size(&filename)).map_err(|e| {
                error!("Failed to commit write to {filename}: {e}");
                StorageError::BackingStore(e)
            })?;

            let last_modified = minute_now();
            self.record_write_outcome(&filename, size, last_modified)?;
            WriteOutcome {
                filename: filename.clone(),
                size,
                last_modified,
                written: payload.len(),
            }
        };

        drop(transaction);
        info!("Committed {:?} of {} bytes to {filename}", mode, payload.len());
        Ok(outcome)
    }
}
