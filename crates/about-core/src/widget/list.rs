//! Canonical encoding of a published widget list.
//!
//! ```text
//! {"version":1,"widgets":[{"type":"custom_markdown","addr":"<id>"}, ...]}
//! ```
//!
//! The slot index is the position in `widgets`.

use super::record::{WidgetKind, WidgetRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current list format version.
pub const LIST_FORMAT_VERSION: u32 = 1;

/// Errors decoding a stored list.
#[derive(Debug, Error)]
pub enum ListCodecError {
    #[error("invalid widget list: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported widget list version {0}")]
    UnsupportedVersion(u32),
}

/// What the published list records about one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetDescriptor {
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub addr: String,
}

/// Ordered slot descriptors, as pinned to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetList {
    pub version: u32,
    pub widgets: Vec<WidgetDescriptor>,
}

impl Default for WidgetList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl WidgetList {
    pub fn new(widgets: Vec<WidgetDescriptor>) -> Self {
        Self {
            version: LIST_FORMAT_VERSION,
            widgets,
        }
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Serialize to the canonical byte form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ListCodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse the canonical byte form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ListCodecError> {
        let list: WidgetList = serde_json::from_slice(bytes)?;
        if list.version != LIST_FORMAT_VERSION {
            return Err(ListCodecError::UnsupportedVersion(list.version));
        }
        Ok(list)
    }

    /// Records for every slot, all waiting on their fetch.
    pub fn pending_records(&self) -> Vec<WidgetRecord> {
        self.widgets
            .iter()
            .enumerate()
            .map(|(index, d)| WidgetRecord::pending(index, d.kind, d.addr.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WidgetList {
        WidgetList::new(vec![
            WidgetDescriptor {
                kind: WidgetKind::CustomMarkdown,
                addr: "aa11".to_string(),
            },
            WidgetDescriptor {
                kind: WidgetKind::ExternalUrl,
                addr: "https://example.org/readme.md".to_string(),
            },
            WidgetDescriptor {
                kind: WidgetKind::IpfsHash,
                addr: "QmHash".to_string(),
            },
        ])
    }

    #[test]
    fn test_roundtrip_preserves_order_and_fields() {
        let list = sample();
        let decoded = WidgetList::from_bytes(&list.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, list);
    }

    #[test]
    fn test_encoding_is_canonical() {
        let bytes = WidgetList::new(vec![WidgetDescriptor {
            kind: WidgetKind::IpfsHash,
            addr: "Qm1".to_string(),
        }])
        .to_bytes()
        .unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"version":1,"widgets":[{"type":"ipfs_hash","addr":"Qm1"}]}"#
        );
        assert_eq!(sample().to_bytes().unwrap(), sample().to_bytes().unwrap());
    }

    #[test]
    fn test_empty_list() {
        let bytes = WidgetList::default().to_bytes().unwrap();
        assert_eq!(bytes, br#"{"version":1,"widgets":[]}"#);
        assert!(WidgetList::from_bytes(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_garbage_and_unknown_versions() {
        assert!(matches!(
            WidgetList::from_bytes(b"# not json"),
            Err(ListCodecError::Json(_))
        ));
        assert!(matches!(
            WidgetList::from_bytes(br#"{"version":7,"widgets":[]}"#),
            Err(ListCodecError::UnsupportedVersion(7))
        ));
        assert!(WidgetList::from_bytes(br#"{"version":1,"widgets":[{"type":"video","addr":"x"}]}"#).is_err());
    }

    #[test]
    fn test_pending_records_follow_positions() {
        let records = sample().pending_records();
        assert_eq!(records.len(), 3);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.index, i);
            assert!(record.is_loading());
        }
        assert_eq!(records[1].kind, WidgetKind::ExternalUrl);
    }
}
