//! Ledger collaborator: anchors the canonical widget list identifier.

use crate::storage::{BoxFuture, ContentId};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use thiserror::Error;

/// Ledger errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The ledger answered but refused the update.
    #[error("update rejected: {0}")]
    Rejected(String),
    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Acknowledgment for an accepted content update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Monotonic sequence number of the update on the ledger.
    pub sequence: u64,
    /// The identifier that is now anchored.
    pub content_id: ContentId,
}

/// Remote ledger holding the single canonical list identifier.
pub trait Ledger: Send + Sync {
    /// Set the canonical list identifier.
    fn update_content(&self, id: &ContentId) -> BoxFuture<'_, LedgerResult<Receipt>>;

    /// Read the currently anchored identifier, if any.
    fn current_content(&self) -> BoxFuture<'_, LedgerResult<Option<ContentId>>>;
}

/// Ledger availability, used to simulate outages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    Accepting,
    Rejecting,
    Offline,
}

/// In-process ledger for tests and the development server.
#[derive(Debug)]
pub struct MemoryLedger {
    content: RwLock<Option<ContentId>>,
    sequence: AtomicU64,
    rejecting: AtomicBool,
    offline: AtomicBool,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self {
            content: RwLock::new(None),
            sequence: AtomicU64::new(0),
            rejecting: AtomicBool::new(false),
            offline: AtomicBool::new(false),
        }
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(&self, mode: LedgerMode) {
        self.rejecting.store(mode == LedgerMode::Rejecting, Ordering::SeqCst);
        self.offline.store(mode == LedgerMode::Offline, Ordering::SeqCst);
    }

    /// Number of accepted updates so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> LedgerResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(LedgerError::Unavailable("ledger node is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Ledger for MemoryLedger {
    fn update_content(&self, id: &ContentId) -> BoxFuture<'_, LedgerResult<Receipt>> {
        let id = id.clone();
        Box::pin(async move {
            self.check_online()?;
            if self.rejecting.load(Ordering::SeqCst) {
                return Err(LedgerError::Rejected("sender lacks permission".to_string()));
            }
            let mut content = self
                .content
                .write()
                .map_err(|e| LedgerError::Unavailable(format!("Lock error: {}", e)))?;
            *content = Some(id.clone());
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Receipt { sequence, content_id: id })
        })
    }

    fn current_content(&self) -> BoxFuture<'_, LedgerResult<Option<ContentId>>> {
        Box::pin(async move {
            self.check_online()?;
            let content = self
                .content
                .read()
                .map_err(|e| LedgerError::Unavailable(format!("Lock error: {}", e)))?;
            Ok(content.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_update_content() {
        let ledger = MemoryLedger::new();
        assert_eq!(block_on(ledger.current_content()).unwrap(), None);

        let receipt = block_on(ledger.update_content(&ContentId::new("Qm1"))).unwrap();
        assert_eq!(receipt.sequence, 1);
        assert_eq!(
            block_on(ledger.current_content()).unwrap(),
            Some(ContentId::new("Qm1"))
        );
    }

    #[test]
    fn test_rejecting_ledger_keeps_content() {
        let ledger = MemoryLedger::new();
        block_on(ledger.update_content(&ContentId::new("Qm1"))).unwrap();

        ledger.set_mode(LedgerMode::Rejecting);
        let result = block_on(ledger.update_content(&ContentId::new("Qm2")));

        assert!(matches!(result, Err(LedgerError::Rejected(_))));
        assert_eq!(ledger.sequence(), 1);
        ledger.set_mode(LedgerMode::Accepting);
        assert_eq!(
            block_on(ledger.current_content()).unwrap(),
            Some(ContentId::new("Qm1"))
        );
    }

    #[test]
    fn test_offline_ledger() {
        let ledger = MemoryLedger::new();
        ledger.set_mode(LedgerMode::Offline);

        assert!(matches!(
            block_on(ledger.update_content(&ContentId::new("Qm1"))),
            Err(LedgerError::Unavailable(_))
        ));
        assert!(block_on(ledger.current_content()).is_err());
    }
}
