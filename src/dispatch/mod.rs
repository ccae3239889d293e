//! JSON request handling
//!
//! Text messages from open connections are parsed into [`Request`]s, routed
//! by the [`Dispatcher`] to the registry store and answered with a
//! [`Response`] envelope. Successful mutations can optionally be broadcast
//! to the other connections as [`RegistryEvent`]s.

pub mod dispatcher;
pub mod notify;
pub mod request;
pub mod response;

pub use dispatcher::Dispatcher;
pub use notify::{Notification, Notifier, RegistryEvent};
pub use request::Request;
pub use response::Response;
