//! Choosing which saved draft, if any, to offer when editing starts.
//!
//! The order is fixed: a local draft wins outright and the server is not
//! asked at all in that attempt. Only without a local draft is the server's
//! temp store probed. Drafts from the two sources are never merged.

use crate::models::{DiaryDate, DraftEntry, EntryStatus};
use crate::remote::RemoteTempStore;
use crate::services::DraftStore;
use crate::session::SessionHandle;

/// What the editor should offer when a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOffer {
    /// A draft saved on this device
    Local(DraftEntry),
    /// The server holds a temp draft; fetched only if accepted
    Remote,
    /// Nothing to recover; start empty
    Empty,
}

/// Result of accepting a remote draft offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAcceptance {
    /// Fields were copied into the session
    Applied,
    /// The server no longer has a temp draft for the date
    Missing,
    /// The fetch failed; the session is unchanged
    Failed { message: String },
}

pub struct DraftReconciler<R> {
    store: DraftStore,
    remote: R,
}

impl<R: RemoteTempStore> DraftReconciler<R> {
    pub const fn new(store: DraftStore, remote: R) -> Self {
        Self { store, remote }
    }

    /// Decide what to offer for `date`.
    ///
    /// Failures on either side degrade to [`DraftOffer::Empty`] so that
    /// writing a new entry is never blocked.
    pub async fn probe(&self, date: &DiaryDate) -> DraftOffer {
        match self.store.fetch(date).await {
            Ok(Some(entry)) => {
                tracing::debug!(%date, "Local draft available");
                return DraftOffer::Local(entry);
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(%date, "Local draft lookup failed: {error}");
            }
        }

        match self.remote.exists_temp(date).await {
            Ok(true) => {
                tracing::debug!(%date, "Remote temp draft available");
                DraftOffer::Remote
            }
            Ok(false) => DraftOffer::Empty,
            Err(error) => {
                tracing::warn!(%date, "Remote draft probe failed: {error}");
                DraftOffer::Empty
            }
        }
    }

    /// Start a session for `date` and work out its draft offer.
    pub async fn begin(&self, date: DiaryDate) -> (SessionHandle, DraftOffer) {
        let offer = self.probe(&date).await;
        (SessionHandle::new(date), offer)
    }

    /// Copy a local draft into the session. The stored record is kept.
    pub async fn accept_local(&self, session: &SessionHandle, entry: &DraftEntry) {
        session.apply_draft(&entry.fields, None).await;
        tracing::info!(date = %entry.date, "Restored local draft");
    }

    /// Fetch the server's temp draft and copy it into the session as Temp.
    pub async fn accept_remote(&self, session: &SessionHandle) -> RemoteAcceptance {
        let date = session.date();
        match self.remote.fetch_temp(&date).await {
            Ok(Some(payload)) => {
                session
                    .apply_draft(&payload.into_fields(), Some(EntryStatus::Temp))
                    .await;
                tracing::info!(%date, "Restored remote temp draft");
                RemoteAcceptance::Applied
            }
            Ok(None) => {
                tracing::warn!(%date, "Remote temp draft disappeared after probe");
                RemoteAcceptance::Missing
            }
            Err(error) => {
                tracing::warn!(%date, "Remote temp draft fetch failed: {error}");
                RemoteAcceptance::Failed {
                    message: error.user_message(),
                }
            }
        }
    }
}
