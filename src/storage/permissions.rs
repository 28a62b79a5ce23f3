//! File permissions
//!
//! Six-character permission strings in the order owner-read, owner-write,
//! group-read, group-write, other-read, other-write. Even positions hold `r`
//! or `-`, odd positions hold `w` or `-`.

use std::fmt;
use std::str::FromStr;

use crate::auth::User;
use crate::error::StorageError;
use crate::storage::record::FileRecord;

pub const GRANT_READ: char = 'r';
pub const GRANT_WRITE: char = 'w';
pub const DENY: char = '-';

/// Read/write grant for one class of users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Access {
    pub read: bool,
    pub write: bool,
}

/// Parsed permission string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub owner: Access,
    pub group: Access,
    pub other: Access,
}

impl FromStr for Permissions {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 6 {
            return Err(StorageError::InvalidPermissionFormat(s.to_string()));
        }

        let mut bits = [false; 6];
        for (i, c) in chars.iter().enumerate() {
            let grant = if i % 2 == 0 { GRANT_READ } else { GRANT_WRITE };
            bits[i] = match *c {
                c if c == grant => true,
                DENY => false,
                _ => return Err(StorageError::InvalidPermissionFormat(s.to_string())),
            };
        }

        Ok(Self {
            owner: Access { read: bits[0], write: bits[1] },
            group: Access { read: bits[2], write: bits[3] },
            other: Access { read: bits[4], write: bits[5] },
        })
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for access in [self.owner, self.group, self.other] {
            let r = if access.read { GRANT_READ } else { DENY };
            let w = if access.write { GRANT_WRITE } else { DENY };
            write!(f, "{r}{w}")?;
        }
        Ok(())
    }
}

/// True iff `s` is a well-formed permission string.
pub fn validate_format(s: &str) -> bool {
    s.parse::<Permissions>().is_ok()
}

fn is_owner(record: &FileRecord, user: &User) -> bool {
    user.name == record.owner
}

fn same_group(record: &FileRecord, user: &User) -> bool {
    user.group == record.group
}

pub fn can_read(record: &FileRecord, user: &User) -> bool {
    let p = record.permissions;
    p.other.read || (same_group(record, user) && p.group.read) || is_owner(record, user)
}

pub fn can_write(record: &FileRecord, user: &User) -> bool {
    let p = record.permissions;
    p.other.write || (same_group(record, user) && p.group.write) || is_owner(record, user)
}

/// Whether `record` shows up in `user`'s listing.
///
/// Any "other" bit or any group bit (for a member) makes a file listable,
/// so a file that is writable but not readable is still listed.
pub fn is_listable(record: &FileRecord, user: &User) -> bool {
    let p = record.permissions;
    p.other.read
        || p.other.write
        || (same_group(record, user) && (p.group.read || p.group.write))
        || is_owner(record, user)
}

/// Only the owner may change a file's permissions.
pub fn can_change_mode(record: &FileRecord, user: &User) -> bool {
    is_owner(record, user)
}
