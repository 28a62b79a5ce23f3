//! Server core functionality
//!
//! This module contains the listener loop and the state shared by every
//! client task.

pub mod context;
pub mod core;

pub use self::context::ServerContext;
pub use self::core::Server;
