//! Client session management
//!
//! Handles client connections, per-session state and the connected-client table.

pub mod handler;
pub mod registry;
pub mod state;

pub use handler::handle_client;
pub use registry::ClientRegistry;
pub use state::ClientSession;
