//! Widget model.
//!
//! A page is an ordered list of widgets. Each slot has a kind, an address in
//! the content store (or an external URL), and a resolution status that is
//! loading, loaded, or failed, never two at once.

mod list;
mod record;

pub use list::{LIST_FORMAT_VERSION, ListCodecError, WidgetDescriptor, WidgetList};
pub use record::{SlotStatus, WidgetEntry, WidgetKind, WidgetRecord};
