//! Age-based cleanup of local drafts.

use crate::config::DEFAULT_RETENTION_DAYS;
use crate::services::DraftStore;
use crate::util::unix_millis_now;
use crate::Result;

/// Deletes local drafts whose creation time is older than the retention window.
///
/// Age is measured from `created_at`, so repeatedly re-saving a draft does
/// not keep it alive.
#[derive(Clone)]
pub struct RetentionSweeper {
    store: DraftStore,
    retention_days: u32,
}

impl RetentionSweeper {
    pub const fn new(store: DraftStore) -> Self {
        Self::with_days(store, DEFAULT_RETENTION_DAYS)
    }

    pub const fn with_days(store: DraftStore, retention_days: u32) -> Self {
        Self {
            store,
            retention_days,
        }
    }

    pub const fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Run one sweep against the current clock. Returns the number removed.
    pub async fn sweep(&self) -> Result<u64> {
        self.sweep_at(unix_millis_now()).await
    }

    pub async fn sweep_at(&self, now_ms: i64) -> Result<u64> {
        let removed = self.store.sweep_at(self.retention_days, now_ms).await?;
        if removed > 0 {
            tracing::info!(
                removed,
                retention_days = self.retention_days,
                "Swept expired local drafts"
            );
        } else {
            tracing::debug!(retention_days = self.retention_days, "No drafts to sweep");
        }
        Ok(removed)
    }
}
