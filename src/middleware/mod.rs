//! Server middleware
//!
//! Provides the audit trail for dispatched commands.

pub mod audit;

pub use audit::{AuditEntry, AuditSink, FileAuditLog, MemoryAuditLog};
