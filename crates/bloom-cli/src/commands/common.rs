use std::path::{Path, PathBuf};

use bloom_core::config::ClientConfig;
use bloom_core::services::DraftStore;
use bloom_core::{DiaryDate, DraftEntry, DraftFields, Emotion};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::{Commands, FieldArgs};
use crate::error::CliError;

const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Serialize)]
pub struct DraftListItem {
    pub date: String,
    pub status: String,
    pub preview: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
}

pub fn parse_date(raw: &str) -> Result<DiaryDate, String> {
    raw.trim().parse::<DiaryDate>().map_err(|error| error.to_string())
}

pub fn parse_emotion(raw: &str) -> Result<Emotion, String> {
    raw.parse::<Emotion>().map_err(|error| error.to_string())
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| format!("expected an RFC 3339 timestamp, got '{raw}': {error}"))
}

/// Fields given on the command line, with blank text treated as absent.
pub fn fields_from_args(args: &FieldArgs) -> DraftFields {
    DraftFields {
        emotion: args.emotion,
        content: normalize_content(args.content.as_deref().unwrap_or_default()),
        sleep_start: args.sleep_start,
        sleep_end: args.sleep_end,
        image_url: None,
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn draft_to_list_item(entry: &DraftEntry, now_ms: i64) -> DraftListItem {
    DraftListItem {
        date: entry.date.to_string(),
        status: entry.status.to_string(),
        preview: entry.content_preview(PREVIEW_CHARS),
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        relative_time: format_relative_time(entry.updated_at, now_ms),
    }
}

pub fn format_draft_lines(entries: &[DraftEntry], now_ms: i64) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let preview = entry.content_preview(PREVIEW_CHARS);
            format!(
                "{}  {:<6}  {:>8}  {}",
                entry.date,
                entry.status,
                format_relative_time(entry.updated_at, now_ms),
                if preview.is_empty() { "(no text)" } else { preview.as_str() }
            )
        })
        .collect()
}

pub fn format_fields(fields: &DraftFields) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(emotion) = fields.emotion {
        lines.push(format!("emotion:     {emotion}"));
    }
    if let Some(start) = fields.sleep_start {
        lines.push(format!("sleep start: {}", start.to_rfc3339()));
    }
    if let Some(end) = fields.sleep_end {
        lines.push(format!("sleep end:   {}", end.to_rfc3339()));
    }
    if let Some(url) = &fields.image_url {
        lines.push(format!("image:       {url}"));
    }
    if let Some(content) = &fields.content {
        lines.push(String::new());
        lines.push(content.clone());
    }
    lines
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else {
        format!("{}d ago", diff / day)
    }
}

/// Read the settings `command` needs. Local-only commands skip the backend ones.
pub fn load_config(command: &Commands) -> Result<ClientConfig, CliError> {
    let config = if command.requires_remote() {
        ClientConfig::from_env()?
    } else {
        ClientConfig::local_from_env()?
    };
    Ok(config)
}

pub fn resolve_db_path(
    cli_db_path: Option<PathBuf>,
    config: &ClientConfig,
) -> Result<PathBuf, CliError> {
    cli_db_path
        .or_else(|| config.db_path.clone())
        .or_else(default_db_path)
        .ok_or(CliError::NoDataDir)
}

pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("bloom").join("drafts.db"))
}

pub async fn open_store(path: &Path) -> Result<DraftStore, CliError> {
    Ok(DraftStore::open_path(path).await?)
}
