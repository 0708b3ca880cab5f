//! Shared draft store used by the editing pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, DraftRepository, LibSqlDraftRepository};
use crate::models::{DiaryDate, DraftEntry, DraftFields, EntryStatus};
use crate::util::{days_to_millis, unix_millis_now};
use crate::Result;

/// Thread-safe store for local drafts.
///
/// Every operation goes through one mutex, so writes to the same date are
/// applied in call order and the last one wins.
#[derive(Clone)]
pub struct DraftStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DraftStore {
    /// Open a draft store at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening draft store at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory draft store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem location of the store, if file-backed.
    pub fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Insert or update the draft for a date.
    pub async fn upsert(
        &self,
        date: &DiaryDate,
        fields: &DraftFields,
        status: EntryStatus,
    ) -> Result<DraftEntry> {
        let db = self.db.lock().await;
        let repo = LibSqlDraftRepository::new(db.connection());
        repo.upsert(date, fields, status).await
    }

    /// Insert or update with an explicit clock reading (Unix ms).
    pub async fn upsert_at(
        &self,
        date: &DiaryDate,
        fields: &DraftFields,
        status: EntryStatus,
        now_ms: i64,
    ) -> Result<DraftEntry> {
        let db = self.db.lock().await;
        let repo = LibSqlDraftRepository::new(db.connection());
        repo.upsert_at(date, fields, status, now_ms).await
    }

    /// Apply the present `fields` on top of the stored draft for a date.
    ///
    /// Fields absent from `fields` keep their stored values. Runs under the
    /// store lock, so no other write lands between the read and the upsert.
    pub async fn merge(
        &self,
        date: &DiaryDate,
        fields: &DraftFields,
        status: EntryStatus,
    ) -> Result<DraftEntry> {
        let db = self.db.lock().await;
        let repo = LibSqlDraftRepository::new(db.connection());
        let mut merged = repo
            .fetch(date)
            .await?
            .map(|entry| entry.fields)
            .unwrap_or_default();
        merged.overlay(fields);
        repo.upsert(date, &merged, status).await
    }

    /// Whether a draft exists for a date.
    pub async fn exists(&self, date: &DiaryDate) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlDraftRepository::new(db.connection());
        repo.exists(date).await
    }

    /// Fetch the draft for a date.
    pub async fn fetch(&self, date: &DiaryDate) -> Result<Option<DraftEntry>> {
        let db = self.db.lock().await;
        let repo = LibSqlDraftRepository::new(db.connection());
        repo.fetch(date).await
    }

    /// Delete the draft for a date.
    pub async fn delete(&self, date: &DiaryDate) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlDraftRepository::new(db.connection());
        let removed = repo.delete(date).await?;
        if removed {
            tracing::info!("Deleted local draft for {date}");
        }
        Ok(removed)
    }

    /// List drafts, most recently updated first.
    pub async fn list(&self) -> Result<Vec<DraftEntry>> {
        let db = self.db.lock().await;
        let repo = LibSqlDraftRepository::new(db.connection());
        repo.list().await
    }

    /// Delete drafts created more than `retention_days` ago.
    pub async fn sweep(&self, retention_days: u32) -> Result<u64> {
        self.sweep_at(retention_days, unix_millis_now()).await
    }

    /// Same as [`Self::sweep`] with an explicit clock reading (Unix ms).
    pub async fn sweep_at(&self, retention_days: u32, now_ms: i64) -> Result<u64> {
        let cutoff = now_ms.saturating_sub(days_to_millis(retention_days));
        let db = self.db.lock().await;
        let repo = LibSqlDraftRepository::new(db.connection());
        repo.delete_created_before(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(raw: &str) -> DiaryDate {
        raw.parse().unwrap()
    }

    fn content(text: &str) -> DraftFields {
        DraftFields {
            content: Some(text.to_string()),
            ..DraftFields::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn merge_fills_only_present_fields() {
        let store = DraftStore::open_in_memory().await.unwrap();
        let day = date("2025-07-20");
        let first = store
            .upsert_at(
                &day,
                &DraftFields {
                    emotion: Some(crate::models::Emotion::Joy),
                    ..DraftFields::default()
                },
                EntryStatus::Temp,
                1_000,
            )
            .await
            .unwrap();

        let merged = store
            .merge(&day, &content("later text"), EntryStatus::Temp)
            .await
            .unwrap();

        assert_eq!(merged.fields.emotion, Some(crate::models::Emotion::Joy));
        assert_eq!(merged.fields.content.as_deref(), Some("later text"));
        assert_eq!(merged.created_at, first.created_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn merge_without_stored_draft_creates_one() {
        let store = DraftStore::open_in_memory().await.unwrap();
        let day = date("2025-07-21");

        let merged = store
            .merge(&day, &content("fresh"), EntryStatus::Temp)
            .await
            .unwrap();

        assert_eq!(merged.fields, content("fresh"));
        assert!(store.exists(&day).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn two_upserts_leave_one_record_with_latest_values() {
        let store = DraftStore::open_in_memory().await.unwrap();
        let day = date("2025-07-20");

        store
            .upsert(&day, &content("morning"), EntryStatus::Temp)
            .await
            .unwrap();
        store
            .upsert(&day, &content("evening"), EntryStatus::Temp)
            .await
            .unwrap();

        let drafts = store.list().await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].fields.content.as_deref(), Some("evening"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_upserts_to_one_date_keep_a_single_record() {
        let store = DraftStore::open_in_memory().await.unwrap();
        let day = date("2025-07-20");

        let mut handles = Vec::new();
        for index in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert(&day, &content(&format!("edit {index}")), EntryStatus::Temp)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sweep_removes_drafts_past_retention() {
        let store = DraftStore::open_in_memory().await.unwrap();
        let now = unix_millis_now();

        store
            .upsert_at(
                &date("2025-06-01"),
                &content("stale"),
                EntryStatus::Temp,
                now - days_to_millis(31),
            )
            .await
            .unwrap();
        store
            .upsert_at(
                &date("2025-06-03"),
                &content("recent"),
                EntryStatus::Temp,
                now - days_to_millis(29),
            )
            .await
            .unwrap();

        let removed = store.sweep_at(30, now).await.unwrap();

        assert_eq!(removed, 1);
        assert!(!store.exists(&date("2025-06-01")).await.unwrap());
        assert!(store.exists(&date("2025-06-03")).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_path_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("drafts.db");

        let store = DraftStore::open_path(&db_path).await.unwrap();
        store
            .upsert(&date("2025-07-20"), &content("persisted"), EntryStatus::Temp)
            .await
            .unwrap();
        drop(store);

        let reopened = DraftStore::open_path(&db_path).await.unwrap();
        let draft = reopened.fetch(&date("2025-07-20")).await.unwrap().unwrap();
        assert_eq!(draft.fields.content.as_deref(), Some("persisted"));
    }
}
