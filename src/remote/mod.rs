//! Client library
//!
//! Connects to a file share server on behalf of one user.

pub mod session;

pub use session::RemoteSession;
