//! Filename validation
//!
//! Files live flat under the storage root, so a name must never be able to
//! address anything outside it.

use crate::error::StorageError;

pub const MAX_FILENAME_LENGTH: usize = 255;

/// Validate that a filename is a single safe path component
pub fn validate_filename(filename: &str) -> Result<(), StorageError> {
    let bad = filename.is_empty()
        || filename.len() > MAX_FILENAME_LENGTH
        || filename.starts_with('.')
        || filename.contains("..")
        || filename.contains(['/', '\\'])
        || filename.chars().any(|c| c.is_control() || c.is_whitespace());

    if bad {
        Err(StorageError::InvalidFilename(filename.to_string()))
    } else {
        Ok(())
    }
}
