//! Error types
//!
//! Defines domain-specific error types for each layer of the file share.

use std::io;

/// Outcome categories reported to clients and to the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidCommand,
    InvalidPermissionFormat,
    InvalidFilename,
    InvalidIdentity,
    IdentityMismatch,
    AlreadyExists,
    CapacityExceeded,
    NotFound,
    Busy,
    PermissionDenied,
    InvalidMode,
    TransferIncomplete,
    BackingStoreError,
}

/// Identity validation errors
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),
    #[error("Identity changed mid-session: expected {expected}, got {provided}")]
    IdentityMismatch { expected: String, provided: String },
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidIdentity(_) => ErrorKind::InvalidIdentity,
            AuthError::IdentityMismatch { .. } => ErrorKind::IdentityMismatch,
        }
    }
}

/// Registry, guard and byte store errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Invalid permission format: {0:?}")]
    InvalidPermissionFormat(String),
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),
    #[error("File already exists: {0}")]
    AlreadyExists(String),
    #[error("Registry is full ({0} files)")]
    CapacityExceeded(usize),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("File is being modified: {0}")]
    Busy(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Backing store error: {0}")]
    BackingStore(#[from] io::Error),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::InvalidPermissionFormat(_) => ErrorKind::InvalidPermissionFormat,
            StorageError::InvalidFilename(_) => ErrorKind::InvalidFilename,
            StorageError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            StorageError::CapacityExceeded(_) => ErrorKind::CapacityExceeded,
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::Busy(_) => ErrorKind::Busy,
            StorageError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            StorageError::BackingStore(_) => ErrorKind::BackingStoreError,
        }
    }
}

/// Command parsing, framing and transfer errors
#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid command: {0:?}")]
    InvalidCommand(String),
    #[error("Invalid write mode: {0:?}")]
    InvalidMode(String),
    #[error("Request too long ({0} bytes)")]
    RequestTooLong(usize),
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Transfer incomplete: {0}")]
    TransferIncomplete(String),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Network error: {0}")]
    Io(#[from] io::Error),
}

impl ProtocolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::InvalidCommand(_)
            | ProtocolError::RequestTooLong(_)
            | ProtocolError::Malformed(_) => ErrorKind::InvalidCommand,
            ProtocolError::InvalidMode(_) => ErrorKind::InvalidMode,
            ProtocolError::TransferIncomplete(_)
            | ProtocolError::ConnectionClosed
            | ProtocolError::Io(_) => ErrorKind::TransferIncomplete,
        }
    }

    /// True when the session can keep reading requests after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidCommand(_)
                | ProtocolError::InvalidMode(_)
                | ProtocolError::RequestTooLong(_)
                | ProtocolError::Malformed(_)
        )
    }
}

/// Error returned by a single dispatched command
#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::Storage(e) => e.kind(),
            CommandError::Protocol(e) => e.kind(),
        }
    }
}

/// General server error that encompasses startup and session failures
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
