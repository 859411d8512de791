//! Widget sync engine: resolves a committed list identifier into widgets.
//!
//! Each resolution is a *pass* with its own token. The list payload is loaded
//! first, then every slot is fetched concurrently and applied as it completes.
//! A slot failure only marks that slot. Requesting a new pass makes every
//! result of older passes stale: they are dropped when they complete and never
//! reach the read model.

use crate::storage::{BoxFuture, ContentId, ContentStore, StorageError};
use crate::widget::{
    ListCodecError, SlotStatus, WidgetEntry, WidgetKind, WidgetList, WidgetRecord,
};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Why a single slot could not be resolved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlotFetchError {
    #[error("{0}")]
    Store(#[from] StorageError),
    #[error("invalid content: {0}")]
    Decode(String),
    #[error("external URLs are not supported by this host: {0}")]
    UnsupportedUrl(String),
    #[error("{0}")]
    Fetch(String),
    #[error("widget has no address")]
    MissingAddress,
}

/// Why the list payload itself could not be loaded.
#[derive(Debug, Error)]
pub enum ListLoadError {
    #[error("{0}")]
    Store(#[from] StorageError),
    #[error(transparent)]
    Decode(#[from] ListCodecError),
}

/// Fetches the markdown behind an external URL widget.
pub trait UrlFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<String, SlotFetchError>>;
}

/// Fetcher for hosts that can't reach external URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUrlFetcher;

impl UrlFetcher for NoUrlFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<String, SlotFetchError>> {
        let url = url.to_string();
        Box::pin(async move { Err(SlotFetchError::UnsupportedUrl(url)) })
    }
}

/// Updates produced while resolving, drained with [`WidgetSyncEngine::poll_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A pass started for this identifier.
    ListLoading { pass: u64, list_id: Option<ContentId> },
    /// The list payload was decoded; all slots are now loading.
    ListLoaded { pass: u64, len: usize },
    /// The list payload could not be loaded.
    ListFailed { pass: u64, message: String },
    /// One slot reached its final state for this pass.
    SlotResolved { pass: u64, record: WidgetRecord },
    /// A newer pass took over before this one finished.
    Superseded { pass: u64 },
}

/// How a resolution pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Every slot of the pass reached a final state.
    Completed,
    /// A newer pass was requested; remaining results were dropped.
    Superseded,
}

/// Events kept for [`WidgetSyncEngine::poll_events`]; older ones are dropped.
pub const MAX_QUEUED_EVENTS: usize = 256;

#[derive(Debug, Default)]
struct SyncState {
    /// Token of the latest requested pass.
    pass: u64,
    list_id: Option<ContentId>,
    records: Vec<WidgetRecord>,
    list_loading: bool,
    list_error: Option<String>,
    events: VecDeque<SyncEvent>,
}

impl SyncState {
    fn push_event(&mut self, event: SyncEvent) {
        if self.events.len() == MAX_QUEUED_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Resolves list identifiers into the widget read model.
///
/// Cloning is cheap; clones share the same read model and pass token.
#[derive(Clone)]
pub struct WidgetSyncEngine {
    store: Arc<dyn ContentStore>,
    urls: Arc<dyn UrlFetcher>,
    state: Arc<Mutex<SyncState>>,
}

impl WidgetSyncEngine {
    /// Create an engine reading from `store`. External URLs are unsupported
    /// until a fetcher is set with [`Self::with_url_fetcher`].
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            urls: Arc::new(NoUrlFetcher),
            state: Arc::new(Mutex::new(SyncState::default())),
        }
    }

    pub fn with_url_fetcher(mut self, urls: Arc<dyn UrlFetcher>) -> Self {
        self.urls = urls;
        self
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        // No mutation spans a panic point, so a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // --- Read model ---

    /// Identifier of the list the read model belongs to.
    pub fn list_id(&self) -> Option<ContentId> {
        self.state().list_id.clone()
    }

    /// Current widgets, in slot order.
    pub fn records(&self) -> Vec<WidgetRecord> {
        self.state().records.clone()
    }

    /// Current widgets in their view-facing shape.
    pub fn entries(&self) -> Vec<WidgetEntry> {
        self.state().records.iter().map(WidgetRecord::entry).collect()
    }

    /// Error from loading the list payload of the current pass, if any.
    pub fn list_error(&self) -> Option<String> {
        self.state().list_error.clone()
    }

    /// Whether the list payload of the current pass is still being fetched.
    pub fn is_list_loading(&self) -> bool {
        self.state().list_loading
    }

    /// Whether the current pass still has outstanding work.
    pub fn is_syncing(&self) -> bool {
        let state = self.state();
        state.list_loading || state.records.iter().any(WidgetRecord::is_loading)
    }

    /// Token of the latest requested pass.
    pub fn current_pass(&self) -> u64 {
        self.state().pass
    }

    /// Drain queued updates.
    ///
    /// At most [`MAX_QUEUED_EVENTS`] are kept between polls.
    pub fn poll_events(&self) -> Vec<SyncEvent> {
        self.state().events.drain(..).collect()
    }

    // --- Resolution ---

    /// Resolve `list_id` into the read model. `None` is the empty list.
    ///
    /// Never fails: list and slot errors are recorded in the read model.
    pub async fn resolve(&self, list_id: Option<ContentId>) -> ResolveOutcome {
        let pass = self.begin_pass(list_id.clone());

        let list = match list_id {
            None => WidgetList::default(),
            Some(id) => match self.load_list(&id).await {
                Ok(list) => list,
                Err(err) => return self.fail_list(pass, err.to_string()),
            },
        };

        let records = list.pending_records();
        if !self.install(pass, records.clone()) {
            return self.superseded(pass);
        }
        self.fetch_slots(pass, records).await
    }

    /// Install a freshly committed list under a new pass.
    ///
    /// Any resolution in flight becomes stale. Returns the new pass token for
    /// [`Self::settle`].
    pub fn adopt(&self, list_id: ContentId, records: Vec<WidgetRecord>) -> u64 {
        let mut state = self.state();
        state.pass += 1;
        let pass = state.pass;
        let records: Vec<_> = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| WidgetRecord { index, ..record })
            .collect();

        log::info!("Adopting committed list {} ({} widgets)", list_id, records.len());
        state.push_event(SyncEvent::ListLoading {
            pass,
            list_id: Some(list_id.clone()),
        });
        state.push_event(SyncEvent::ListLoaded {
            pass,
            len: records.len(),
        });
        state.list_id = Some(list_id);
        state.records = records;
        state.list_loading = false;
        state.list_error = None;
        pass
    }

    /// Fetch every slot of pass `pass` that has no content yet.
    pub async fn settle(&self, pass: u64) -> ResolveOutcome {
        let pending: Vec<WidgetRecord> = {
            let state = self.state();
            if state.pass != pass {
                return ResolveOutcome::Superseded;
            }
            state.records.iter().filter(|r| r.is_loading()).cloned().collect()
        };
        self.fetch_slots(pass, pending).await
    }

    fn begin_pass(&self, list_id: Option<ContentId>) -> u64 {
        let mut state = self.state();
        state.pass += 1;
        let pass = state.pass;
        log::debug!("Resolution pass {} for {:?}", pass, list_id);
        state.push_event(SyncEvent::ListLoading {
            pass,
            list_id: list_id.clone(),
        });
        state.list_id = list_id;
        state.records.clear();
        state.list_loading = true;
        state.list_error = None;
        pass
    }

    async fn load_list(&self, id: &ContentId) -> Result<WidgetList, ListLoadError> {
        let bytes = self.store.get(id).await?;
        Ok(WidgetList::from_bytes(&bytes)?)
    }

    /// Make `records` visible if `pass` is still current.
    fn install(&self, pass: u64, records: Vec<WidgetRecord>) -> bool {
        let mut state = self.state();
        if state.pass != pass {
            return false;
        }
        state.push_event(SyncEvent::ListLoaded {
            pass,
            len: records.len(),
        });
        state.records = records;
        state.list_loading = false;
        true
    }

    fn fail_list(&self, pass: u64, message: String) -> ResolveOutcome {
        let mut state = self.state();
        if state.pass != pass {
            drop(state);
            return self.superseded(pass);
        }
        log::warn!("Failed to load widget list for pass {}: {}", pass, message);
        state.push_event(SyncEvent::ListFailed {
            pass,
            message: message.clone(),
        });
        state.list_loading = false;
        state.list_error = Some(message);
        ResolveOutcome::Completed
    }

    fn superseded(&self, pass: u64) -> ResolveOutcome {
        log::debug!("Resolution pass {} superseded", pass);
        self.state().push_event(SyncEvent::Superseded { pass });
        ResolveOutcome::Superseded
    }

    /// Fetch all `pending` slots concurrently, applying each as it lands.
    async fn fetch_slots(&self, pass: u64, pending: Vec<WidgetRecord>) -> ResolveOutcome {
        let mut fetches: FuturesUnordered<_> = pending
            .into_iter()
            .map(|record| async move {
                let result = self.fetch_slot(&record).await;
                (record.index, result)
            })
            .collect();

        while let Some((index, result)) = fetches.next().await {
            if !self.apply_slot(pass, index, result) {
                return self.superseded(pass);
            }
        }
        ResolveOutcome::Completed
    }

    async fn fetch_slot(&self, record: &WidgetRecord) -> Result<String, SlotFetchError> {
        let addr = record.addr.as_deref().ok_or(SlotFetchError::MissingAddress)?;
        match record.kind {
            WidgetKind::CustomMarkdown | WidgetKind::IpfsHash => {
                let bytes = self.store.get(&ContentId::new(addr)).await?;
                String::from_utf8(bytes).map_err(|e| SlotFetchError::Decode(e.to_string()))
            }
            WidgetKind::ExternalUrl => self.urls.fetch(addr).await,
        }
    }

    /// Apply a slot result. Returns false if `pass` is stale.
    fn apply_slot(
        &self,
        pass: u64,
        index: usize,
        result: Result<String, SlotFetchError>,
    ) -> bool {
        let mut state = self.state();
        if state.pass != pass {
            log::warn!(
                "Dropping stale result for slot {} from pass {} (current {})",
                index,
                pass,
                state.pass
            );
            return false;
        }
        let Some(record) = state.records.get_mut(index) else {
            return true;
        };
        record.status = match result {
            Ok(content) => {
                log::debug!("Slot {} resolved", index);
                SlotStatus::Loaded(content)
            }
            Err(err) => {
                log::warn!("Slot {} failed: {}", index, err);
                SlotStatus::Failed(err.to_string())
            }
        };
        let record = record.clone();
        state.push_event(SyncEvent::SlotResolved { pass, record });
        true
    }
}
