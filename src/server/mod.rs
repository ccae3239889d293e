//! Registry server
//!
//! - `listener`: TCP accept loop, connection limit, session ids
//! - `connection`: per-connection handshake and message loop
//! - `config`: server options

pub mod config;
pub mod connection;
pub mod listener;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::RegistryServer;
