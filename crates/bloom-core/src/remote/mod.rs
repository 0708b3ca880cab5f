//! Diary backend boundary.
//!
//! The pipeline only talks to the server through [`RemoteTempStore`] and
//! [`crate::media::UploadTransport`]; [`DiaryApiClient`] implements both over
//! HTTP.

mod client;

pub use client::DiaryApiClient;

use crate::models::{CreatedEntry, DiaryDate, SubmissionRequest, TempDraftPayload};
use crate::Result;

/// Server-side temporary draft endpoints plus the create-entry call.
///
/// The existence probe and the fetch are pure reads. Creating an entry
/// supersedes any temp record the server keeps for that date.
#[allow(async_fn_in_trait)]
pub trait RemoteTempStore {
    /// Lightweight check for a server-side temp draft.
    async fn exists_temp(&self, date: &DiaryDate) -> Result<bool>;

    /// Full fetch of the temp draft; `None` when the server has none.
    async fn fetch_temp(&self, date: &DiaryDate) -> Result<Option<TempDraftPayload>>;

    /// Create (or finalize) the entry for a date.
    async fn create_entry(&self, request: &SubmissionRequest) -> Result<CreatedEntry>;
}
