//! Content-addressed storage abstraction.
//!
//! The store is an opaque put/get service: `put` returns an identifier derived
//! from the bytes, `get` returns the bytes for an identifier. No business
//! logic lives here.

mod memory;
mod file;

pub use file::FileContentStore;
pub use memory::MemoryContentStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Immutable address returned by a content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Wrap an identifier string as returned by a store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identifier for a payload.
    ///
    /// Identical bytes always map to the same id, so re-pinning is a no-op.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Storage errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("not found")]
    NotFound(ContentId),
    #[error("{0}")]
    Unreachable(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async store and ledger calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for content-addressed storage backends.
///
/// Implementations can keep payloads in memory, on disk, or forward them to
/// a remote node. `put` must be deterministic for identical input, or at
/// least safe to retry.
pub trait ContentStore: Send + Sync {
    /// Store a payload, optionally pinning it, and return its identifier.
    fn put(&self, bytes: &[u8], pin: bool) -> BoxFuture<'_, StorageResult<ContentId>>;

    /// Fetch the payload stored under `id`.
    fn get(&self, id: &ContentId) -> BoxFuture<'_, StorageResult<Vec<u8>>>;

    /// Check if a payload exists.
    fn exists(&self, id: &ContentId) -> BoxFuture<'_, StorageResult<bool>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_is_deterministic() {
        let a = ContentId::for_bytes(b"# Hello");
        let b = ContentId::for_bytes(b"# Hello");
        let c = ContentId::for_bytes(b"# Hello!");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_not_found_message() {
        let err = StorageError::NotFound(ContentId::new("Qm1"));
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn test_content_id_serializes_as_string() {
        let id = ContentId::new("Qm000");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"Qm000\"");
    }
}
