//! In-memory content store implementation.

use super::{BoxFuture, ContentId, ContentStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
struct StoredPayload {
    bytes: Vec<u8>,
    pinned: bool,
}

/// In-memory content store for testing and ephemeral use.
#[derive(Debug)]
pub struct MemoryContentStore {
    payloads: RwLock<HashMap<ContentId, StoredPayload>>,
    online: AtomicBool,
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self {
            payloads: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
        }
    }
}

impl MemoryContentStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backend going away (or coming back).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of payloads currently pinned.
    pub fn pinned_count(&self) -> usize {
        self.payloads
            .read()
            .map(|p| p.values().filter(|e| e.pinned).count())
            .unwrap_or(0)
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unreachable("content store is offline".to_string()))
        }
    }
}

impl ContentStore for MemoryContentStore {
    fn put(&self, bytes: &[u8], pin: bool) -> BoxFuture<'_, StorageResult<ContentId>> {
        let bytes = bytes.to_vec();
        Box::pin(async move {
            self.check_online()?;
            let id = ContentId::for_bytes(&bytes);
            let mut payloads = self.payloads.write().map_err(|e| {
                StorageError::Unreachable(format!("Lock error: {}", e))
            })?;
            let entry = payloads
                .entry(id.clone())
                .or_insert(StoredPayload { bytes, pinned: false });
            entry.pinned |= pin;
            Ok(id)
        })
    }

    fn get(&self, id: &ContentId) -> BoxFuture<'_, StorageResult<Vec<u8>>> {
        let id = id.clone();
        Box::pin(async move {
            self.check_online()?;
            let payloads = self.payloads.read().map_err(|e| {
                StorageError::Unreachable(format!("Lock error: {}", e))
            })?;
            payloads
                .get(&id)
                .map(|e| e.bytes.clone())
                .ok_or(StorageError::NotFound(id))
        })
    }

    fn exists(&self, id: &ContentId) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.clone();
        Box::pin(async move {
            self.check_online()?;
            let payloads = self.payloads.read().map_err(|e| {
                StorageError::Unreachable(format!("Lock error: {}", e))
            })?;
            Ok(payloads.contains_key(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_put_and_get() {
        let store = MemoryContentStore::new();

        let id = block_on(store.put(b"# About us", true)).unwrap();
        let loaded = block_on(store.get(&id)).unwrap();

        assert_eq!(loaded, b"# About us");
        assert_eq!(store.pinned_count(), 1);
    }

    #[test]
    fn test_put_is_idempotent() {
        let store = MemoryContentStore::new();

        let first = block_on(store.put(b"same", true)).unwrap();
        let second = block_on(store.put(b"same", true)).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.pinned_count(), 1);
    }

    #[test]
    fn test_unpinned_put_is_pinned_later() {
        let store = MemoryContentStore::new();

        block_on(store.put(b"draft", false)).unwrap();
        assert_eq!(store.pinned_count(), 0);
        block_on(store.put(b"draft", true)).unwrap();
        assert_eq!(store.pinned_count(), 1);
    }

    #[test]
    fn test_not_found() {
        let store = MemoryContentStore::new();
        let result = block_on(store.get(&ContentId::new("missing")));

        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists() {
        let store = MemoryContentStore::new();
        let id = ContentId::for_bytes(b"x");

        assert!(!block_on(store.exists(&id)).unwrap());
        block_on(store.put(b"x", true)).unwrap();
        assert!(block_on(store.exists(&id)).unwrap());
    }

    #[test]
    fn test_offline_store_is_unreachable() {
        let store = MemoryContentStore::new();
        let id = block_on(store.put(b"x", true)).unwrap();

        store.set_online(false);
        assert!(matches!(block_on(store.get(&id)), Err(StorageError::Unreachable(_))));
        assert!(matches!(block_on(store.put(b"y", true)), Err(StorageError::Unreachable(_))));

        store.set_online(true);
        assert!(block_on(store.get(&id)).is_ok());
    }
}
