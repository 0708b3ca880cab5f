//! Submission and remote payload models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

use super::draft::{DiaryDate, DraftFields, Emotion};

/// Status an entry is saved under on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Finalized entry; every required field must be present
    #[default]
    Normal,
    /// Recoverable partial save
    Temp,
}

impl EntryStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Temp => "TEMP",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(Self::Normal),
            "TEMP" => Ok(Self::Temp),
            _ => Err(Error::InvalidInput(format!("Unknown entry status '{s}'"))),
        }
    }
}

/// A field that must be filled in before an entry can be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    Date,
    Emotion,
    Content,
    SleepStart,
    SleepEnd,
}

impl RequiredField {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Emotion => "emotion",
            Self::Content => "content",
            Self::SleepStart => "sleepStart",
            Self::SleepEnd => "sleepEnd",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of the create-entry call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub date: DiaryDate,
    pub emotion: Option<Emotion>,
    pub content: Option<String>,
    pub sleep_start: Option<DateTime<Utc>>,
    pub sleep_end: Option<DateTime<Utc>>,
    /// Always serialized, `null` when the entry has no image
    pub image_url: Option<String>,
    pub status: EntryStatus,
}

impl SubmissionRequest {
    /// Assemble a request from edited fields and an already-resolved image URL.
    #[must_use]
    pub fn assemble(
        date: DiaryDate,
        status: EntryStatus,
        fields: &DraftFields,
        image_url: Option<String>,
    ) -> Self {
        Self {
            date,
            emotion: fields.emotion,
            content: fields.content.clone(),
            sleep_start: fields.sleep_start,
            sleep_end: fields.sleep_end,
            image_url,
            status,
        }
    }
}

/// Entry returned by the backend after a successful create-entry call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEntry {
    #[serde(default)]
    pub id: Option<i64>,
    pub date: DiaryDate,
    pub status: EntryStatus,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Server-side temp draft as returned by the fetch-temp call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempDraftPayload {
    pub date: DiaryDate,
    #[serde(default)]
    pub emotion: Option<Emotion>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub sleep_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sleep_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl TempDraftPayload {
    #[must_use]
    pub fn into_fields(self) -> DraftFields {
        DraftFields {
            emotion: self.emotion,
            content: self.content,
            sleep_start: self.sleep_start,
            sleep_end: self.sleep_end,
            image_url: self.image_url,
        }
    }
}
