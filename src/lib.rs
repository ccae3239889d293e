//! Service-discovery registry served over WebSocket
//!
//! Endpoints on a network connect to the registry over WebSocket, announce
//! themselves with a `register` request and discover each other with `list`.
//! Every message is a JSON text frame answered with a
//! `{"success": bool, "message": string}` envelope.
//!
//! # Layers
//!
//! ```text
//!   TCP ─► protocol::Handshake ─► protocol::FrameDecoder ─► dispatch::Dispatcher
//!          (101 / 400)            (masked client frames)     │
//!                                                            ▼
//!                                                   registry::RegistryStore
//! ```
//!
//! # Example
//!
//! ```no_run
//! use wsregistry::{RegistryServer, ServerConfig};
//!
//! # async fn example() -> wsregistry::error::Result<()> {
//! let config = ServerConfig::default().notify_changes(true);
//! let server = RegistryServer::new(config);
//!
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use dispatch::{Dispatcher, Request, Response};
pub use error::{Error, Result};
pub use registry::{Address, EntryType, RegistryConfig, RegistryEntry, RegistryStore};
pub use server::{RegistryServer, ServerConfig};
