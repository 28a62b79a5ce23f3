//! Client registry
//!
//! Tracks connected clients so the server can cap concurrent sessions.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Registry for tracking active clients
#[derive(Default)]
pub struct ClientRegistry {
    clients: HashMap<SocketAddr, DateTime<Local>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `addr` unless `max_clients` sessions are already active.
    pub fn try_insert(&mut self, addr: SocketAddr, max_clients: usize) -> bool {
        if self.clients.len() >= max_clients {
            return false;
        }
        self.clients.insert(addr, Local::now());
        true
    }

    pub fn remove(&mut self, addr: &SocketAddr) -> Option<DateTime<Local>> {
        self.clients.remove(addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
