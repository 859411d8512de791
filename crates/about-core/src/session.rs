//! Edit session controller.
//!
//! ```text
//! Viewing --enter_edit--> Editing   draft := copy of committed list
//! Editing --select_slot-> Editing   Some(i) edits slot i, None appends
//! Editing --apply_widget> Editing   draft only, no network
//! Editing --cancel------> Viewing   draft dropped
//! Editing --commit------> Viewing   on success; stays Editing with the
//!                                   error and the untouched draft otherwise
//! ```
//!
//! The committed list is the sync engine's read model. Only a successful
//! publish replaces it, all at once. Editing is refused while that list is
//! loading or failed to load, since the draft would start out empty.
//!
//! A commit returns as soon as the new list is adopted. Fetching the content
//! of new URL and hash widgets is left to [`WidgetSyncEngine::settle`].

use crate::panel::{PanelForm, WidgetInput};
use crate::publish::{PublishError, PublishPipeline, Published};
use crate::storage::ContentId;
use crate::sync::WidgetSyncEngine;
use crate::widget::WidgetRecord;
use thiserror::Error;

/// Whether the page is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Viewing,
    Editing,
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("not in edit mode")]
    NotEditing,
    #[error("already in edit mode")]
    AlreadyEditing,
    #[error("no widget at slot {0}")]
    NoSuchSlot(usize),
    #[error("committed widget list is still loading")]
    CommittedListLoading,
    #[error("committed widget list could not be loaded: {0}")]
    CommittedListUnavailable(String),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Working state while editing.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    draft: Vec<WidgetRecord>,
    /// Slot being edited; `None` targets a new widget.
    selected_slot: Option<usize>,
    /// Error from the last failed commit.
    last_error: Option<PublishError>,
}

impl EditSession {
    fn new(draft: Vec<WidgetRecord>) -> Self {
        Self {
            draft,
            selected_slot: None,
            last_error: None,
        }
    }

    pub fn draft(&self) -> &[WidgetRecord] {
        &self.draft
    }

    pub fn selected_slot(&self) -> Option<usize> {
        self.selected_slot
    }

    pub fn last_error(&self) -> Option<&PublishError> {
        self.last_error.as_ref()
    }
}

/// A successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    /// Identifier now anchored on the ledger.
    pub list_id: ContentId,
    /// Pass under which the list was adopted; hand it to
    /// [`WidgetSyncEngine::settle`] to fetch the widgets still loading.
    pub pass: u64,
}

/// Owns the edit session and drives commits through the publish pipeline.
pub struct EditSessionController {
    engine: WidgetSyncEngine,
    pipeline: PublishPipeline,
    session: Option<EditSession>,
}

impl EditSessionController {
    pub fn new(engine: WidgetSyncEngine, pipeline: PublishPipeline) -> Self {
        Self {
            engine,
            pipeline,
            session: None,
        }
    }

    pub fn mode(&self) -> EditMode {
        if self.session.is_some() {
            EditMode::Editing
        } else {
            EditMode::Viewing
        }
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// The draft while editing.
    pub fn draft(&self) -> Option<&[WidgetRecord]> {
        self.session.as_ref().map(EditSession::draft)
    }

    pub fn last_error(&self) -> Option<&PublishError> {
        self.session.as_ref().and_then(EditSession::last_error)
    }

    /// The engine whose read model is the committed list.
    pub fn engine(&self) -> &WidgetSyncEngine {
        &self.engine
    }

    fn editing(&mut self) -> Result<&mut EditSession, SessionError> {
        self.session.as_mut().ok_or(SessionError::NotEditing)
    }

    /// Copy of the committed list, if it is fully known.
    fn committed_records(&self) -> Result<Vec<WidgetRecord>, SessionError> {
        if let Some(err) = self.engine.list_error() {
            return Err(SessionError::CommittedListUnavailable(err));
        }
        if self.engine.is_list_loading() {
            return Err(SessionError::CommittedListLoading);
        }
        Ok(self.engine.records())
    }

    /// Start editing from a copy of the committed list.
    pub fn enter_edit(&mut self) -> Result<(), SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyEditing);
        }
        let draft = self.committed_records()?;
        log::debug!("Entering edit mode with {} widgets", draft.len());
        self.session = Some(EditSession::new(draft));
        Ok(())
    }

    /// Choose the slot the next [`Self::apply_widget`] replaces.
    pub fn select_slot(&mut self, slot: Option<usize>) -> Result<(), SessionError> {
        let session = self.editing()?;
        if let Some(index) = slot {
            if index >= session.draft.len() {
                return Err(SessionError::NoSuchSlot(index));
            }
        }
        session.selected_slot = slot;
        Ok(())
    }

    /// The editor form for the current selection.
    pub fn panel_form(&self) -> Result<PanelForm, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NotEditing)?;
        Ok(session
            .selected_slot
            .and_then(|i| session.draft.get(i))
            .map(PanelForm::for_record)
            .unwrap_or_default())
    }

    /// Replace the selected slot, or append when nothing is selected.
    ///
    /// Returns the slot the widget landed in.
    pub fn apply_widget(&mut self, input: WidgetInput) -> Result<usize, SessionError> {
        let session = self.editing()?;
        let index = match session.selected_slot {
            Some(index) => {
                let slot = session
                    .draft
                    .get_mut(index)
                    .ok_or(SessionError::NoSuchSlot(index))?;
                *slot = input.into_record(index);
                index
            }
            None => {
                let index = session.draft.len();
                session.draft.push(input.into_record(index));
                index
            }
        };
        Ok(index)
    }

    /// Drop the draft and return to viewing.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.editing()?;
        log::debug!("Edit session cancelled");
        self.session = None;
        Ok(())
    }

    /// Publish the draft as the new committed list.
    ///
    /// On failure the session stays in edit mode with the draft unchanged and
    /// the error recorded, so the commit can be retried.
    pub async fn commit(&mut self) -> Result<Committed, SessionError> {
        let draft = self.editing()?.draft.clone();

        match self.pipeline.publish(&draft).await {
            Ok(published) => {
                self.session = None;
                Ok(self.install(published))
            }
            Err(err) => {
                log::warn!("Commit failed, keeping draft: {}", err);
                if let Some(session) = self.session.as_mut() {
                    session.last_error = Some(err.clone());
                }
                Err(err.into())
            }
        }
    }

    /// Append one widget to the committed list and publish it right away,
    /// without an edit session.
    pub async fn quick_add(&mut self, input: WidgetInput) -> Result<Committed, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyEditing);
        }
        let mut widgets = self.committed_records()?;
        widgets.push(input.into_record(widgets.len()));

        let published = self.pipeline.publish(&widgets).await?;
        Ok(self.install(published))
    }

    /// Make a published list the committed one.
    fn install(&self, published: Published) -> Committed {
        let list_id = published.list_id;
        log::info!("Committed widget list {}", list_id);
        let pass = self.engine.adopt(list_id.clone(), published.records);
        Committed { list_id, pass }
    }
}
