//! Editing session for one diary date.
//!
//! A [`SessionHandle`] is the single owner of the in-progress fields for a
//! date. Clones share the same state, and every read or write goes through
//! one async mutex so renderers never observe a half-applied edit.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::{DiaryDate, DraftEntry, DraftFields, EntryStatus, ImageAttachment};
use crate::services::DraftStore;
use crate::Result;

/// Why a local draft save was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveReason {
    /// Connectivity dropped while editing
    Disconnected,
    /// The app moved to the background
    Backgrounded,
    /// The user asked to keep the draft
    Manual,
}

impl SaveReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Backgrounded => "backgrounded",
            Self::Manual => "manual",
        }
    }
}

/// Point-in-time copy of a session's editing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingSession {
    pub date: DiaryDate,
    pub fields: DraftFields,
    pub status: EntryStatus,
    /// Picked image, not yet uploaded
    pub image: Option<ImageAttachment>,
    pub completed: bool,
}

impl EditingSession {
    fn new(date: DiaryDate) -> Self {
        Self {
            date,
            fields: DraftFields::default(),
            status: EntryStatus::Normal,
            image: None,
            completed: false,
        }
    }

    /// Whether the session holds anything worth keeping as a draft.
    ///
    /// An attached image alone does not count: its bytes are never persisted.
    pub fn is_draft_worthy(&self) -> bool {
        self.fields.is_draft_worthy()
    }
}

/// Shared handle to the editing state of one date.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    date: DiaryDate,
    inner: Arc<Mutex<EditingSession>>,
}

impl SessionHandle {
    /// Start an empty session for a date.
    pub fn new(date: DiaryDate) -> Self {
        Self {
            date,
            inner: Arc::new(Mutex::new(EditingSession::new(date))),
        }
    }

    pub const fn date(&self) -> DiaryDate {
        self.date
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> EditingSession {
        self.inner.lock().await.clone()
    }

    /// Apply an edit to the fields.
    pub async fn edit(&self, apply: impl FnOnce(&mut DraftFields)) {
        let mut session = self.inner.lock().await;
        apply(&mut session.fields);
    }

    pub async fn set_status(&self, status: EntryStatus) {
        self.inner.lock().await.status = status;
    }

    pub async fn attach_image(&self, image: ImageAttachment) {
        self.inner.lock().await.image = Some(image);
    }

    /// Copy every present field of a recovered draft into the session.
    pub async fn apply_draft(&self, fields: &DraftFields, status: Option<EntryStatus>) {
        let mut session = self.inner.lock().await;
        session.fields.overlay(fields);
        if let Some(status) = status {
            session.status = status;
        }
    }

    pub async fn is_completed(&self) -> bool {
        self.inner.lock().await.completed
    }

    /// Mark the entry as submitted and drop the in-memory editing state.
    pub(crate) async fn complete(&self) {
        let mut session = self.inner.lock().await;
        session.fields = DraftFields::default();
        session.image = None;
        session.completed = true;
    }

    /// Persist the current fields as the local Temp draft, replacing any stored one.
    ///
    /// Does nothing for a submitted session or one with nothing entered yet.
    pub async fn save_draft(
        &self,
        store: &DraftStore,
        reason: SaveReason,
    ) -> Result<Option<DraftEntry>> {
        let Some(fields) = self.fields_to_save(reason).await else {
            return Ok(None);
        };

        let entry = store.upsert(&self.date, &fields, EntryStatus::Temp).await?;
        tracing::info!(
            date = %self.date,
            reason = reason.as_str(),
            "Saved local draft"
        );
        Ok(Some(entry))
    }

    /// Like [`Self::save_draft`], but fields the session has not set keep
    /// whatever the stored draft holds.
    pub async fn merge_into_draft(
        &self,
        store: &DraftStore,
        reason: SaveReason,
    ) -> Result<Option<DraftEntry>> {
        let Some(fields) = self.fields_to_save(reason).await else {
            return Ok(None);
        };

        let entry = store.merge(&self.date, &fields, EntryStatus::Temp).await?;
        tracing::info!(
            date = %self.date,
            reason = reason.as_str(),
            "Merged into local draft"
        );
        Ok(Some(entry))
    }

    async fn fields_to_save(&self, reason: SaveReason) -> Option<DraftFields> {
        let session = self.inner.lock().await;
        if session.completed || !session.is_draft_worthy() {
            tracing::debug!(
                date = %self.date,
                reason = reason.as_str(),
                "Skipping draft save"
            );
            return None;
        }
        Some(session.fields.clone())
    }
}
