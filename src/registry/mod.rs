//! Service registry
//!
//! The registry holds the entries announced by endpoints on the network and
//! answers lookups from anyone connected to it.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<RegistryStore>
//!                  ┌──────────────────────────┐
//!                  │ RwLock<                  │
//!                  │   entries: HashMap<Uuid, │
//!                  │     RegistryEntry>       │
//!                  │ >                        │
//!                  └────────────┬─────────────┘
//!                               │
//!         ┌─────────────────────┼─────────────────────┐
//!         │                     │                     │
//!         ▼                     ▼                     ▼
//!   [Connection 1]        [Connection 2]        [Connection N]
//!   register()            list()                unregister()
//! ```
//!
//! Entries arrive as loosely typed [`EntryDraft`]s and are turned into typed
//! [`RegistryEntry`] values by ordered validation before they reach the store.

pub mod config;
pub mod entry;
pub mod error;
pub mod store;
pub mod validate;

pub use config::RegistryConfig;
pub use entry::{Address, EntryType, RegistryEntry};
pub use error::{RegistryError, ValidationError};
pub use store::RegistryStore;
pub use validate::EntryDraft;
