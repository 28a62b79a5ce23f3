//! Wire messages
//!
//! Every request and response travels as one JSON object per line.

use serde::{Deserialize, Serialize};

use crate::auth::User;
use crate::error::{ErrorKind, status_label};

/// A command stamped with the identity the client asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub user: User,
    pub command: String,
}

impl Request {
    pub fn new(user: User, command: impl Into<String>) -> Self {
        Self {
            user,
            command: command.into(),
        }
    }
}

/// Outcome label plus payload (listing, file bytes, or empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: String,
    #[serde(default)]
    pub content: String,
}

impl Response {
    pub fn new(status: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            content: content.into(),
        }
    }

    /// A response with no payload
    pub fn status(status: impl Into<String>) -> Self {
        Self::new(status, String::new())
    }

    pub fn failure(kind: ErrorKind) -> Self {
        Self::status(status_label(kind))
    }

    pub fn is(&self, status: &str) -> bool {
        self.status == status
    }
}
