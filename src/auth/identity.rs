//! Asserted client identity
//!
//! Identity is self-asserted by the client and trusted as-is; nothing here
//! proves that a client really is who it claims to be.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user as asserted by the connecting client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub group: String,
}

impl User {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.group)
    }
}
