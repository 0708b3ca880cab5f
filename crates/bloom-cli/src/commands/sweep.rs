use std::path::Path;

use bloom_core::retention::RetentionSweeper;

use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_sweep(retention_days: u32, db_path: &Path) -> Result<u64, CliError> {
    let store = open_store(db_path).await?;
    let removed = RetentionSweeper::with_days(store, retention_days)
        .sweep()
        .await?;

    println!("Removed {removed} draft(s) older than {retention_days} days");
    Ok(removed)
}
