//! Error handling
//!
//! Defines error types and handling for the file share.

pub mod handlers;
pub mod types;

pub use handlers::status_label;
pub use types::*;
