//! File-based content store for native platforms.

use super::{BoxFuture, ContentId, ContentStore, StorageError, StorageResult};
use std::fs;
use std::path::PathBuf;

const BLOCKS_DIR: &str = "blocks";
const PINS_DIR: &str = "pins";

/// File-based content store.
///
/// Payloads live in `<base>/blocks/<id>`; pinned ids get an empty marker in
/// `<base>/pins/<id>`.
pub struct FileContentStore {
    /// Base directory for the store.
    base_path: PathBuf,
}

impl FileContentStore {
    /// Create a new file store with the given base directory.
    ///
    /// Creates the directories if they don't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        for dir in [BLOCKS_DIR, PINS_DIR] {
            let path = base_path.join(dir);
            if !path.exists() {
                fs::create_dir_all(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to create {}: {}", path.display(), e))
                })?;
            }
        }
        Ok(Self { base_path })
    }

    /// Create a file store in the default location.
    ///
    /// On Unix: `~/.local/share/about/store/`
    /// On Windows: `%LOCALAPPDATA%\about\store\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("about").join("store"))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Path of the payload for `id`, or `None` if the id can't name a file.
    fn block_path(&self, id: &ContentId) -> Option<PathBuf> {
        is_safe_id(id).then(|| self.base_path.join(BLOCKS_DIR).join(id.as_str()))
    }

    fn pin_path(&self, id: &ContentId) -> Option<PathBuf> {
        is_safe_id(id).then(|| self.base_path.join(PINS_DIR).join(id.as_str()))
    }
}

/// User-supplied hashes reach `get`, so only plain alphanumeric ids map to files.
fn is_safe_id(id: &ContentId) -> bool {
    !id.as_str().is_empty() && id.as_str().chars().all(|c| c.is_ascii_alphanumeric())
}

impl ContentStore for FileContentStore {
    fn put(&self, bytes: &[u8], pin: bool) -> BoxFuture<'_, StorageResult<ContentId>> {
        let id = ContentId::for_bytes(bytes);
        let bytes = bytes.to_vec();

        Box::pin(async move {
            let (Some(block), Some(marker)) = (self.block_path(&id), self.pin_path(&id)) else {
                return Err(StorageError::Io(format!("Unusable content id {}", id)));
            };
            if !block.exists() {
                fs::write(&block, &bytes).map_err(|e| {
                    StorageError::Io(format!("Failed to write {}: {}", block.display(), e))
                })?;
            }
            if pin && !marker.exists() {
                fs::write(&marker, b"").map_err(|e| {
                    StorageError::Io(format!("Failed to pin {}: {}", marker.display(), e))
                })?;
            }
            Ok(id)
        })
    }

    fn get(&self, id: &ContentId) -> BoxFuture<'_, StorageResult<Vec<u8>>> {
        let path = self.block_path(id);
        let id = id.clone();

        Box::pin(async move {
            let path = match path {
                Some(p) if p.exists() => p,
                _ => return Err(StorageError::NotFound(id)),
            };
            fs::read(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })
        })
    }

    fn exists(&self, id: &ContentId) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.block_path(id);
        Box::pin(async move { Ok(path.is_some_and(|p| p.exists())) })
    }
}
