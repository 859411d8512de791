//! Widget records: one slot of the About page and its sync status.

use super::list::WidgetDescriptor;
use serde::{Deserialize, Serialize};

/// How a widget's address and content are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    /// Markdown written in the editor and stored as its own payload.
    CustomMarkdown,
    /// A `.md` file served from an external URL.
    ExternalUrl,
    /// A `.md` file already present in the content store.
    IpfsHash,
}

impl WidgetKind {
    /// All kinds, in the order the type picker lists them.
    pub const ALL: [WidgetKind; 3] = [
        WidgetKind::CustomMarkdown,
        WidgetKind::ExternalUrl,
        WidgetKind::IpfsHash,
    ];

    /// Kind for a type-picker position.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this kind in the type picker.
    pub fn index(self) -> usize {
        match self {
            WidgetKind::CustomMarkdown => 0,
            WidgetKind::ExternalUrl => 1,
            WidgetKind::IpfsHash => 2,
        }
    }

    /// Display name for the type picker.
    pub fn label(self) -> &'static str {
        match self {
            WidgetKind::CustomMarkdown => "Custom markdown",
            WidgetKind::ExternalUrl => "External URL (.md file)",
            WidgetKind::IpfsHash => "IPFS hash (.md file)",
        }
    }
}

/// Resolution state of a single slot.
///
/// A slot is in exactly one of these states at rest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotStatus {
    /// A fetch for this slot is outstanding.
    #[default]
    Loading,
    /// Content was resolved.
    Loaded(String),
    /// Resolution failed; the message is shown on this slot only.
    Failed(String),
}

/// One widget of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetRecord {
    /// Slot position; display order is index order.
    pub index: usize,
    pub kind: WidgetKind,
    /// Where the payload lives. `None` until a markdown slot is published.
    pub addr: Option<String>,
    pub status: SlotStatus,
}

impl WidgetRecord {
    /// A published slot whose content has not been fetched yet.
    pub fn pending(index: usize, kind: WidgetKind, addr: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            addr: Some(addr.into()),
            status: SlotStatus::Loading,
        }
    }

    /// A markdown slot written locally and not yet published.
    pub fn markdown(index: usize, content: impl Into<String>) -> Self {
        Self {
            index,
            kind: WidgetKind::CustomMarkdown,
            addr: None,
            status: SlotStatus::Loaded(content.into()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, SlotStatus::Loading)
    }

    pub fn content(&self) -> Option<&str> {
        match &self.status {
            SlotStatus::Loaded(content) => Some(content),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            SlotStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Descriptor stored in the published list, if the slot has an address.
    pub fn descriptor(&self) -> Option<WidgetDescriptor> {
        self.addr.as_ref().map(|addr| WidgetDescriptor {
            kind: self.kind,
            addr: addr.clone(),
        })
    }

    /// View-facing shape of this record.
    pub fn entry(&self) -> WidgetEntry {
        WidgetEntry {
            index: self.index,
            kind: self.kind,
            addr: self.addr.clone(),
            content: self.content().map(str::to_string),
            is_loading: self.is_loading(),
            error_message: self.error_message().map(str::to_string),
        }
    }
}

/// Read model exposed to the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetEntry {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub is_loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
