//! Shared server state
//!
//! One `ServerContext` is shared by every client task.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::middleware::AuditSink;
use crate::storage::{ByteStore, FileRegistry};

pub struct ServerContext {
    pub registry: Arc<FileRegistry>,
    pub audit: Arc<dyn AuditSink>,
    pub config: Arc<ServerConfig>,
}

impl ServerContext {
    pub fn new(config: ServerConfig, store: Arc<dyn ByteStore>, audit: Arc<dyn AuditSink>) -> Self {
        let registry = Arc::new(FileRegistry::new(store, config.max_files));
        Self {
            registry,
            audit,
            config: Arc::new(config),
        }
    }
}
