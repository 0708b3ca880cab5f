use std::path::Path;

use bloom_core::session::{SaveReason, SessionHandle};
use bloom_core::util::unix_millis_now;
use bloom_core::{DiaryDate, DraftEntry};

use crate::cli::FieldArgs;
use crate::commands::common::{
    draft_to_list_item, fields_from_args, format_draft_lines, format_fields, open_store,
    DraftListItem,
};
use crate::error::CliError;

pub async fn run_draft_save(
    date: DiaryDate,
    args: &FieldArgs,
    db_path: &Path,
) -> Result<DraftEntry, CliError> {
    let fields = fields_from_args(args);
    if !fields.is_draft_worthy() {
        return Err(CliError::EmptyDraft);
    }

    let session = SessionHandle::new(date);
    session.edit(|current| *current = fields).await;
    let store = open_store(db_path).await?;
    let entry = session
        .merge_into_draft(&store, SaveReason::Manual)
        .await?
        .ok_or(CliError::EmptyDraft)?;
    println!("Saved draft for {date}");
    Ok(entry)
}

pub async fn run_draft_show(date: DiaryDate, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let entry = store
        .fetch(&date)
        .await?
        .ok_or_else(|| CliError::DraftNotFound(date.to_string()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("{}  [{}]", entry.date, entry.status);
        for line in format_fields(&entry.fields) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_draft_delete(date: DiaryDate, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    if !store.delete(&date).await? {
        return Err(CliError::DraftNotFound(date.to_string()));
    }
    println!("{date}");
    Ok(())
}

pub async fn run_draft_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let entries = store.list().await?;
    let now_ms = unix_millis_now();

    if as_json {
        let items = entries
            .iter()
            .map(|entry| draft_to_list_item(entry, now_ms))
            .collect::<Vec<DraftListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if entries.is_empty() {
        println!("No local drafts");
    } else {
        for line in format_draft_lines(&entries, now_ms) {
            println!("{line}");
        }
    }
    Ok(())
}
