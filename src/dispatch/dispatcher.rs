//! Request dispatcher
//!
//! Receive -> parse -> route -> validate -> apply -> respond. One dispatcher
//! is shared by every connection of a server; it owns no per-connection
//! state.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;

use super::notify::{Notification, Notifier, RegistryEvent};
use super::request::Request;
use super::response::{Response, MSG_DUPLICATE_ID, MSG_UNKNOWN_ID};
use crate::registry::validate::{parse_address, parse_id};
use crate::registry::{EntryDraft, RegistryError, RegistryStore};

/// Routes requests to the registry store
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<RegistryStore>,
    notifier: Option<Notifier>,
    lenient_quotes: bool,
}

impl Dispatcher {
    /// Create a dispatcher over a store
    ///
    /// Lenient quoting is on and change notifications are off.
    pub fn new(store: Arc<RegistryStore>) -> Self {
        Self {
            store,
            notifier: None,
            lenient_quotes: true,
        }
    }

    /// Publish registry changes to subscribers
    pub fn with_notifications(mut self) -> Self {
        let capacity = self.store.config().notification_capacity;
        self.notifier = Some(Notifier::new(capacity));
        self
    }

    /// Enable or disable the single-quote retry
    pub fn lenient_quotes(mut self, enabled: bool) -> Self {
        self.lenient_quotes = enabled;
        self
    }

    pub fn store(&self) -> &Arc<RegistryStore> {
        &self.store
    }

    /// Subscribe to change notifications, if enabled
    pub fn subscribe(&self) -> Option<broadcast::Receiver<Notification>> {
        self.notifier.as_ref().map(Notifier::subscribe)
    }

    /// Handle one text message from `session_id`
    pub async fn handle_text(&self, session_id: u64, text: &str) -> Response {
        let request = Request::parse(text, self.lenient_quotes);
        self.handle(session_id, request).await
    }

    /// Handle a parsed request
    pub async fn handle(&self, session_id: u64, request: Request) -> Response {
        tracing::debug!(session_id = session_id, request = request.kind(), "Dispatching");

        match request {
            Request::List => Response::with_list(self.store.list().await),
            Request::Register(draft) => self.register(session_id, &draft).await,
            Request::Unregister { id } => self.unregister(session_id, id.as_ref()).await,
            Request::UpdateAddress { id, address } => {
                self.update_address(session_id, id.as_ref(), address.as_ref())
                    .await
            }
            Request::Unrecognized(_) => Response::unknown_request(),
        }
    }

    async fn register(&self, session_id: u64, draft: &EntryDraft) -> Response {
        let entry = match draft.validate(self.store.config()) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(session_id = session_id, error = %e, "Registration rejected");
                return Response::fail(e.to_string());
            }
        };

        match self.store.register(entry.clone()).await {
            Ok(()) => {
                self.publish(session_id, RegistryEvent::Registered { entry });
                Response::ok()
            }
            Err(e) => Self::store_failure(session_id, e),
        }
    }

    async fn unregister(&self, session_id: u64, id: Option<&Value>) -> Response {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(e) => return Response::fail(e.to_string()),
        };

        match self.store.unregister(&id).await {
            Ok(_) => {
                self.publish(session_id, RegistryEvent::Unregistered { id });
                Response::ok()
            }
            Err(e) => Self::store_failure(session_id, e),
        }
    }

    async fn update_address(
        &self,
        session_id: u64,
        id: Option<&Value>,
        address: Option<&Value>,
    ) -> Response {
        let parsed = parse_id(id).and_then(|id| parse_address(address).map(|addr| (id, addr)));
        let (id, address) = match parsed {
            Ok(pair) => pair,
            Err(e) => return Response::fail(e.to_string()),
        };

        match self.store.update_address(&id, address.clone()).await {
            Ok(()) => {
                self.publish(session_id, RegistryEvent::AddressUpdated { id, address });
                Response::ok()
            }
            Err(e) => Self::store_failure(session_id, e),
        }
    }

    fn store_failure(session_id: u64, error: RegistryError) -> Response {
        tracing::debug!(session_id = session_id, error = %error, "Store rejected request");
        match error {
            RegistryError::DuplicateId(_) => Response::fail(MSG_DUPLICATE_ID),
            RegistryError::NotFound(_) => Response::fail(MSG_UNKNOWN_ID),
        }
    }

    fn publish(&self, session_id: u64, event: RegistryEvent) {
        if let Some(ref notifier) = self.notifier {
            let receivers = notifier.publish(session_id, &event);
            tracing::trace!(session_id = session_id, receivers = receivers, "Change published");
        }
    }
}
