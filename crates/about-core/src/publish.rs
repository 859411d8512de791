//! Publish pipeline: widget list → pinned list identifier → ledger.
//!
//! Publishing is strictly sequential. Unpublished markdown slots are pinned
//! first, then the canonical list, and only then is the ledger asked to
//! anchor the new identifier. A ledger failure leaves a pinned but unanchored
//! list behind, which is harmless: identical content pins to the same id, so
//! a retry costs nothing.

use crate::ledger::{Ledger, LedgerError, Receipt};
use crate::storage::{ContentId, ContentStore, StorageError};
use crate::widget::{ListCodecError, WidgetKind, WidgetList, WidgetRecord};
use std::sync::Arc;
use thiserror::Error;

/// Why a publish attempt failed. Every variant is safe to retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PublishError {
    #[error("content store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("ledger rejected the update: {0}")]
    LedgerRejected(String),
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),
    #[error("widget {0} has neither an address nor content")]
    Incomplete(usize),
    #[error("could not encode widget list: {0}")]
    Encode(String),
}

impl From<StorageError> for PublishError {
    fn from(err: StorageError) -> Self {
        PublishError::StoreUnavailable(err.to_string())
    }
}

impl From<ListCodecError> for PublishError {
    fn from(err: ListCodecError) -> Self {
        PublishError::Encode(err.to_string())
    }
}

impl From<LedgerError> for PublishError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected(msg) => PublishError::LedgerRejected(msg),
            LedgerError::Unavailable(msg) => PublishError::LedgerUnavailable(msg),
        }
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    /// Identifier of the pinned list, now anchored on the ledger.
    pub list_id: ContentId,
    pub receipt: Receipt,
    /// The published widgets, every slot carrying its address.
    pub records: Vec<WidgetRecord>,
}

/// Turns widget lists into anchored identifiers.
#[derive(Clone)]
pub struct PublishPipeline {
    store: Arc<dyn ContentStore>,
    ledger: Arc<dyn Ledger>,
    pin: bool,
}

impl PublishPipeline {
    pub fn new(store: Arc<dyn ContentStore>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            store,
            ledger,
            pin: true,
        }
    }

    /// Whether payloads are pinned when stored (on by default).
    pub fn with_pinning(mut self, pin: bool) -> Self {
        self.pin = pin;
        self
    }

    /// Publish `widgets` as the new canonical list.
    ///
    /// `widgets` is not modified; the published form is returned.
    pub async fn publish(&self, widgets: &[WidgetRecord]) -> Result<Published, PublishError> {
        let records = self.store_slots(widgets).await?;
        let list_id = self.pin_list(&records).await?;

        log::info!("Submitting widget list {} to the ledger", list_id);
        let receipt = self.ledger.update_content(&list_id).await.map_err(|err| {
            log::warn!("Ledger refused widget list {}: {}", list_id, err);
            PublishError::from(err)
        })?;
        log::info!(
            "Ledger anchored widget list {} (sequence {})",
            list_id,
            receipt.sequence
        );

        Ok(Published {
            list_id,
            receipt,
            records,
        })
    }

    /// Serialize and pin the list, returning its identifier.
    pub async fn pin_list(&self, records: &[WidgetRecord]) -> Result<ContentId, PublishError> {
        let descriptors = records
            .iter()
            .map(|r| r.descriptor().ok_or(PublishError::Incomplete(r.index)))
            .collect::<Result<Vec<_>, _>>()?;
        let bytes = WidgetList::new(descriptors).to_bytes()?;

        let list_id = self.store.put(&bytes, self.pin).await?;
        log::info!("Pinned widget list {} ({} widgets)", list_id, records.len());
        Ok(list_id)
    }

    /// Store the content of markdown slots that have no address yet.
    async fn store_slots(&self, widgets: &[WidgetRecord]) -> Result<Vec<WidgetRecord>, PublishError> {
        let mut records = Vec::with_capacity(widgets.len());
        for (index, widget) in widgets.iter().enumerate() {
            let mut record = WidgetRecord {
                index,
                ..widget.clone()
            };
            if record.addr.is_none() {
                let content = match (record.kind, record.content()) {
                    (WidgetKind::CustomMarkdown, Some(content)) => content.to_string(),
                    _ => return Err(PublishError::Incomplete(index)),
                };
                let id = self.store.put(content.as_bytes(), self.pin).await?;
                log::debug!("Stored markdown for slot {} as {}", index, id);
                record.addr = Some(id.to_string());
            }
            records.push(record);
        }
        Ok(records)
    }
}
