//! Module `state`
//!
//! Per-connection state: the peer address and the identity the session is
//! bound to.

use std::net::SocketAddr;

use crate::auth::{User, validate_identity, validate_same_identity};
use crate::error::AuthError;

/// Represents the state of a connected client.
///
/// The identity is taken from the first request and stays fixed afterwards.
pub struct ClientSession {
    client_addr: SocketAddr,
    user: Option<User>,
    commands_handled: u64,
}

impl ClientSession {
    pub fn new(client_addr: SocketAddr) -> Self {
        Self {
            client_addr,
            user: None,
            commands_handled: 0,
        }
    }

    /// Binds the session to `asserted` on first use, then insists on it.
    pub fn bind_identity(&mut self, asserted: &User, max_length: usize) -> Result<(), AuthError> {
        match self.user {
            Some(ref bound) => validate_same_identity(bound, asserted)?,
            None => {
                validate_identity(asserted, max_length)?;
                self.user = Some(asserted.clone());
            }
        }
        Ok(())
    }

    pub fn record_command(&mut self) {
        self.commands_handled += 1;
    }

    pub fn client_addr(&self) -> &SocketAddr {
        &self.client_addr
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn commands_handled(&self) -> u64 {
        self.commands_handled
    }
}
