//! Single-widget editor form.
//!
//! The side panel edits one widget at a time: a type picker and one text
//! field (markdown body, URL, or hash depending on the type). Validation
//! errors stay here and never reach the sync engine.

use crate::widget::{WidgetKind, WidgetRecord};
use thiserror::Error;
use url::Url;

/// Form-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("content cannot be empty")]
    EmptyContent,
    #[error("unknown widget type {0}")]
    UnknownType(usize),
    #[error("not an http(s) URL: {0}")]
    InvalidUrl(String),
    #[error("not a content hash: {0}")]
    InvalidHash(String),
}

/// A validated widget, ready to be applied to the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetInput {
    Markdown(String),
    ExternalUrl(String),
    IpfsHash(String),
}

impl WidgetInput {
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetInput::Markdown(_) => WidgetKind::CustomMarkdown,
            WidgetInput::ExternalUrl(_) => WidgetKind::ExternalUrl,
            WidgetInput::IpfsHash(_) => WidgetKind::IpfsHash,
        }
    }

    /// Draft record for slot `index`.
    pub fn into_record(self, index: usize) -> WidgetRecord {
        match self {
            WidgetInput::Markdown(content) => WidgetRecord::markdown(index, content),
            WidgetInput::ExternalUrl(url) => WidgetRecord::pending(index, WidgetKind::ExternalUrl, url),
            WidgetInput::IpfsHash(hash) => WidgetRecord::pending(index, WidgetKind::IpfsHash, hash),
        }
    }
}

/// State of the editor form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelForm {
    /// Position in the type picker (see [`WidgetKind::from_index`]).
    pub kind_index: usize,
    pub text: String,
}

impl PanelForm {
    /// Empty form for a new widget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Form prefilled from an existing widget.
    pub fn for_record(record: &WidgetRecord) -> Self {
        let text = match record.kind {
            WidgetKind::CustomMarkdown => record.content().unwrap_or_default().to_string(),
            WidgetKind::ExternalUrl | WidgetKind::IpfsHash => record.addr.clone().unwrap_or_default(),
        };
        Self {
            kind_index: record.kind.index(),
            text,
        }
    }

    pub fn set_kind(&mut self, kind_index: usize) {
        self.kind_index = kind_index;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn validate(&self) -> Result<WidgetInput, ValidationError> {
        let kind = WidgetKind::from_index(self.kind_index)
            .ok_or(ValidationError::UnknownType(self.kind_index))?;
        let text = self.text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyContent);
        }

        match kind {
            // Markdown keeps its surrounding whitespace.
            WidgetKind::CustomMarkdown => Ok(WidgetInput::Markdown(self.text.clone())),
            WidgetKind::ExternalUrl => match Url::parse(text) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {
                    Ok(WidgetInput::ExternalUrl(url.to_string()))
                }
                _ => Err(ValidationError::InvalidUrl(text.to_string())),
            },
            WidgetKind::IpfsHash => {
                if text.chars().all(|c| c.is_ascii_alphanumeric()) {
                    Ok(WidgetInput::IpfsHash(text.to_string()))
                } else {
                    Err(ValidationError::InvalidHash(text.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_form() {
        let mut form = PanelForm::new();
        form.set_text("## Hello\n");

        let input = form.validate().unwrap();
        assert_eq!(input, WidgetInput::Markdown("## Hello\n".to_string()));

        let record = input.into_record(4);
        assert_eq!(record.index, 4);
        assert_eq!(record.content(), Some("## Hello\n"));
        assert_eq!(record.addr, None);
    }

    #[test]
    fn test_empty_content_rejected() {
        let mut form = PanelForm::new();
        form.set_text("   \n");
        assert_eq!(form.validate(), Err(ValidationError::EmptyContent));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let form = PanelForm {
            kind_index: 5,
            text: "x".to_string(),
        };
        assert_eq!(form.validate(), Err(ValidationError::UnknownType(5)));
    }

    #[test]
    fn test_url_form() {
        let mut form = PanelForm::new();
        form.set_kind(WidgetKind::ExternalUrl.index());

        form.set_text(" https://example.org/README.md ");
        let record = form.validate().unwrap().into_record(0);
        assert_eq!(record.kind, WidgetKind::ExternalUrl);
        assert_eq!(record.addr.as_deref(), Some("https://example.org/README.md"));
        assert!(record.is_loading());

        form.set_text("ftp://example.org/a.md");
        assert!(matches!(form.validate(), Err(ValidationError::InvalidUrl(_))));
        form.set_text("not a url");
        assert!(matches!(form.validate(), Err(ValidationError::InvalidUrl(_))));
    }

    #[test]
    fn test_hash_form() {
        let mut form = PanelForm::new();
        form.set_kind(WidgetKind::IpfsHash.index());

        form.set_text("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG");
        assert!(matches!(form.validate(), Ok(WidgetInput::IpfsHash(_))));

        form.set_text("Qm abc");
        assert!(matches!(form.validate(), Err(ValidationError::InvalidHash(_))));
    }

    #[test]
    fn test_prefill_from_record() {
        let markdown = WidgetRecord::markdown(0, "body");
        assert_eq!(
            PanelForm::for_record(&markdown),
            PanelForm {
                kind_index: 0,
                text: "body".to_string()
            }
        );

        let hash = WidgetRecord::pending(1, WidgetKind::IpfsHash, "QmFile");
        let form = PanelForm::for_record(&hash);
        assert_eq!(form.kind_index, 2);
        assert_eq!(form.text, "QmFile");
    }
}
