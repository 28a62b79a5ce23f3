pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod remote;
pub mod server;
pub mod storage;

pub use server::Server;
