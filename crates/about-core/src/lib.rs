//! About Core Library
//!
//! Edit/publish synchronization for an About page made of widgets stored in a
//! content-addressed store and anchored by one identifier on a ledger.

pub mod config;
pub mod ledger;
pub mod panel;
pub mod publish;
pub mod session;
pub mod storage;
pub mod sync;
pub mod widget;

pub use config::{AboutConfig, StoreConfig};
pub use ledger::{Ledger, LedgerError, LedgerMode, MemoryLedger, Receipt};
pub use panel::{PanelForm, ValidationError, WidgetInput};
pub use publish::{PublishError, PublishPipeline, Published};
pub use session::{Committed, EditMode, EditSession, EditSessionController, SessionError};
pub use storage::{ContentId, ContentStore, FileContentStore, MemoryContentStore, StorageError};
pub use sync::{ResolveOutcome, SlotFetchError, SyncEvent, UrlFetcher, WidgetSyncEngine};
pub use widget::{SlotStatus, WidgetDescriptor, WidgetEntry, WidgetKind, WidgetList, WidgetRecord};
