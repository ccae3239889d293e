//! Registry store implementation
//!
//! The single table of registered entries shared by every connection.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::config::RegistryConfig;
use super::entry::{Address, RegistryEntry};
use super::error::RegistryError;

/// Entry plus its registration sequence number
#[derive(Debug, Clone)]
struct Slot {
    seq: u64,
    entry: RegistryEntry,
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<Uuid, Slot>,
    next_seq: u64,
}

/// Central table of registered entries
///
/// Thread-safe via `RwLock`. Every mutation holds the write lock for its
/// whole duration, so `list` never observes a half-applied change.
pub struct RegistryStore {
    inner: RwLock<StoreInner>,

    /// Configuration
    config: RegistryConfig,
}

impl RegistryStore {
    /// Create a new store with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new store with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Snapshot of all entries in registration order
    pub async fn list(&self) -> Vec<RegistryEntry> {
        let inner = self.inner.read().await;

        let mut slots: Vec<&Slot> = inner.entries.values().collect();
        slots.sort_unstable_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.entry.clone()).collect()
    }

    /// Add an entry
    ///
    /// Fails if an entry with the same id is already present.
    pub async fn register(&self, entry: RegistryEntry) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;

        if inner.entries.contains_key(&entry.id) {
            return Err(RegistryError::DuplicateId(entry.id));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;

        tracing::info!(
            id = %entry.id,
            name = %entry.name,
            topic = %entry.topic,
            entry_type = %entry.entry_type,
            address = %entry.address,
            "Entry registered"
        );

        inner.entries.insert(entry.id, Slot { seq, entry });
        Ok(())
    }

    /// Remove an entry, returning it
    pub async fn unregister(&self, id: &Uuid) -> Result<RegistryEntry, RegistryError> {
        let mut inner = self.inner.write().await;

        let slot = inner
            .entries
            .remove(id)
            .ok_or(RegistryError::NotFound(*id))?;

        tracing::info!(id = %id, name = %slot.entry.name, "Entry unregistered");
        Ok(slot.entry)
    }

    /// Replace the address of an entry
    pub async fn update_address(&self, id: &Uuid, address: Address) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;

        let slot = inner
            .entries
            .get_mut(id)
            .ok_or(RegistryError::NotFound(*id))?;

        tracing::info!(
            id = %id,
            old = %slot.entry.address,
            new = %address,
            "Entry address updated"
        );

        slot.entry.address = address;
        Ok(())
    }

    /// Look up a single entry
    pub async fn get(&self, id: &Uuid) -> Option<RegistryEntry> {
        let inner = self.inner.read().await;
        inner.entries.get(id).map(|slot| slot.entry.clone())
    }

    /// Number of registered entries
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

impl Default for RegistryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::registry::entry::EntryType;

    fn entry(name: &str) -> RegistryEntry {
        RegistryEntry::new(
            Uuid::new_v4(),
            name,
            "camera",
            EntryType::Streamer,
            Address::new("127.0.0.1", 10102),
        )
    }

    #[tokio::test]
    async fn test_fresh_store_is_empty() {
        let store = RegistryStore::new();
        assert!(store.list().await.is_empty());
        assert!(store.is_empty().await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let store = RegistryStore::new();
        let first = entry("first");
        let second = entry("second");

        store.register(first.clone()).await.unwrap();
        store.register(second.clone()).await.unwrap();

        // Registration order is preserved
        assert_eq!(store.list().await, vec![first.clone(), second]);
        assert_eq!(store.get(&first.id).await, Some(first));
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = RegistryStore::new();
        let e = entry("camera");

        store.register(e.clone()).await.unwrap();
        let result = store.register(e.clone()).await;

        assert_eq!(result, Err(RegistryError::DuplicateId(e.id)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_same_content_different_ids() {
        let store = RegistryStore::new();
        let a = entry("camera");
        let mut b = a.clone();
        b.id = Uuid::new_v4();

        store.register(a).await.unwrap();
        store.register(b).await.unwrap();

        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_unregister() {
        let store = RegistryStore::new();
        let e = entry("camera");
        store.register(e.clone()).await.unwrap();

        assert_eq!(store.unregister(&e.id).await, Ok(e.clone()));
        assert!(store.is_empty().await);
        assert_eq!(
            store.unregister(&e.id).await,
            Err(RegistryError::NotFound(e.id))
        );
    }

    #[tokio::test]
    async fn test_update_address() {
        let store = RegistryStore::new();
        let e = entry("camera");
        store.register(e.clone()).await.unwrap();

        let new_addr = Address::new("10.0.0.9", 9000).with_scheme("ws");
        store.update_address(&e.id, new_addr.clone()).await.unwrap();
        assert_eq!(store.get(&e.id).await.unwrap().address, new_addr);

        let missing = Uuid::new_v4();
        assert_eq!(
            store.update_address(&missing, new_addr).await,
            Err(RegistryError::NotFound(missing))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations() {
        let store = Arc::new(RegistryStore::new());

        let mut handles = Vec::new();
        for i in 0..64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.register(entry(&format!("node-{}", i))).await.unwrap();
                // Every snapshot is a complete prefix of registrations
                let snapshot = store.list().await;
                assert!(!snapshot.is_empty());
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let all = store.list().await;
        assert_eq!(all.len(), 64);
        let unique: std::collections::HashSet<_> = all.iter().map(|e| e.id).collect();
        assert_eq!(unique.len(), 64);
    }
}
