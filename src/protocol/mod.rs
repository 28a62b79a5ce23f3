//! File share protocol implementation
//!
//! Handles command parsing, message framing, dispatch and response labels.

pub mod codec;
pub mod commands;
pub mod handlers;
pub mod messages;
pub mod responses;

pub use codec::{read_message, read_payload, write_message, write_payload};
pub use commands::{Command, parse_command, parse_write_mode};
pub use handlers::{CommandResult, CommandStatus, handle_command};
pub use messages::{Request, Response};
