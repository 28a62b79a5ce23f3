//! Error handlers
//!
//! Turns error kinds into the status labels carried by responses and audit lines.

use crate::error::types::ErrorKind;
use log::{error, warn};

/// Log a command failure at a level matching its severity
pub fn log_failure(client: &str, err: &dyn std::error::Error, kind: ErrorKind) {
    match kind {
        ErrorKind::BackingStoreError | ErrorKind::TransferIncomplete => {
            error!("Client {client}: {err}")
        }
        _ => warn!("Client {client}: {err}"),
    }
}

/// Convert an error kind to its client-visible status label
pub fn status_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidCommand => "Invalid command",
        ErrorKind::InvalidPermissionFormat => "Invalid permission format",
        ErrorKind::InvalidFilename => "Invalid filename",
        ErrorKind::InvalidIdentity => "Invalid identity",
        ErrorKind::IdentityMismatch => "Identity mismatch",
        ErrorKind::AlreadyExists => "File already exists",
        ErrorKind::CapacityExceeded => "File capacity exceeded",
        ErrorKind::NotFound => "File not found",
        ErrorKind::Busy => "File is modifying",
        ErrorKind::PermissionDenied => "Permission denied",
        ErrorKind::InvalidMode => "Invalid write mode",
        ErrorKind::TransferIncomplete => "Transfer incomplete",
        ErrorKind::BackingStoreError => "Backing store error",
    }
}
