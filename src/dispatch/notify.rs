//! Change notifications
//!
//! When enabled, every successful mutation is published to all other open
//! connections through a `tokio::sync::broadcast` channel. The payload is
//! serialized once and shared by reference count across receivers.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::registry::{Address, RegistryEntry};

/// A registry change, as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum RegistryEvent {
    Registered { entry: RegistryEntry },
    Unregistered { id: Uuid },
    AddressUpdated { id: Uuid, address: Address },
}

/// A serialized event and the session that caused it
#[derive(Debug, Clone)]
pub struct Notification {
    pub origin: u64,
    pub payload: Arc<str>,
}

/// Sending half of the notification channel
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Publish an event
    ///
    /// Returns the number of receivers, 0 if nobody is listening.
    pub fn publish(&self, origin: u64, event: &RegistryEvent) -> usize {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize notification");
                return 0;
            }
        };

        self.tx
            .send(Notification {
                origin,
                payload: Arc::from(payload),
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::registry::EntryType;

    #[test]
    fn test_event_format() {
        let id = Uuid::parse_str("1b4e28ba-2fa1-41d2-883f-0016d3cca427").unwrap();

        let removed = serde_json::to_value(RegistryEvent::Unregistered { id }).unwrap();
        assert_eq!(
            removed,
            json!({"event": "unregistered", "id": "1b4e28ba-2fa1-41d2-883f-0016d3cca427"})
        );

        let moved = serde_json::to_value(RegistryEvent::AddressUpdated {
            id,
            address: Address::new("10.0.0.1", 80),
        })
        .unwrap();
        assert_eq!(moved["event"], "address-updated");
        assert_eq!(moved["address"], "10.0.0.1:80");
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe();

        let entry = RegistryEntry::new(
            Uuid::new_v4(),
            "hub",
            "camera",
            EntryType::Messagehub,
            Address::new("127.0.0.1", 10105),
        );
        let receivers = notifier.publish(7, &RegistryEvent::Registered { entry });
        assert_eq!(receivers, 1);

        let note = rx.recv().await.unwrap();
        assert_eq!(note.origin, 7);
        let value: Value = serde_json::from_str(&note.payload).unwrap();
        assert_eq!(value["event"], "registered");
        assert_eq!(value["entry"]["name"], "hub");
    }

    #[test]
    fn test_publish_without_receivers() {
        let notifier = Notifier::new(4);
        let id = Uuid::new_v4();
        assert_eq!(notifier.publish(1, &RegistryEvent::Unregistered { id }), 0);
    }
}
