//! Configuration for hosts embedding the engine.

use crate::storage::{ContentStore, FileContentStore, MemoryContentStore, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default listen address for the development server.
pub const DEFAULT_BIND: &str = "0.0.0.0:3040";

/// Which content store backend to use.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Ephemeral in-process store.
    #[default]
    Memory,
    /// Store on disk; `dir` defaults to the platform data directory.
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dir: Option<PathBuf>,
    },
}

impl StoreConfig {
    /// Open the configured backend.
    pub fn open(&self) -> StorageResult<Arc<dyn ContentStore>> {
        Ok(match self {
            StoreConfig::Memory => Arc::new(MemoryContentStore::new()),
            StoreConfig::File { dir: Some(dir) } => Arc::new(FileContentStore::new(dir.clone())?),
            StoreConfig::File { dir: None } => Arc::new(FileContentStore::default_location()?),
        })
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutConfig {
    pub store: StoreConfig,
    /// Listen address for the development server.
    pub bind: SocketAddr,
    /// Whether stored payloads are pinned.
    pub pin: bool,
}

impl Default for AboutConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            bind: DEFAULT_BIND.parse().unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3040))),
            pin: true,
        }
    }
}

impl AboutConfig {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> StorageResult<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path).map_err(|e| {
            StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}
