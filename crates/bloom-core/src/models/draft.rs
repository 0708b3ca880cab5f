//! Draft model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

use super::submission::EntryStatus;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar date a diary entry belongs to, rendered as `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiaryDate(NaiveDate);

impl DiaryDate {
    /// Get the `YYYY-MM-DD` representation of this date
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DiaryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for DiaryDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| Error::InvalidInput(format!("Invalid diary date '{s}', expected YYYY-MM-DD")))
    }
}

/// Emotion recorded for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Emotion {
    Joy,
    Calm,
    Neutral,
    Sad,
    Angry,
    Anxious,
    Tired,
}

impl Emotion {
    pub const ALL: [Self; 7] = [
        Self::Joy,
        Self::Calm,
        Self::Neutral,
        Self::Sad,
        Self::Angry,
        Self::Anxious,
        Self::Tired,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Joy => "JOY",
            Self::Calm => "CALM",
            Self::Neutral => "NEUTRAL",
            Self::Sad => "SAD",
            Self::Angry => "ANGRY",
            Self::Anxious => "ANXIOUS",
            Self::Tired => "TIRED",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|emotion| emotion.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown emotion '{s}'")))
    }
}

/// Editable fields of a diary entry; every field may be absent while drafting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFields {
    pub emotion: Option<Emotion>,
    pub content: Option<String>,
    pub sleep_start: Option<DateTime<Utc>>,
    pub sleep_end: Option<DateTime<Utc>>,
    /// Remote image URL. Local image bytes live on the editing session only.
    pub image_url: Option<String>,
}

impl DraftFields {
    /// Check whether any field holds something worth saving.
    ///
    /// Whitespace-only content counts as empty.
    #[must_use]
    pub fn is_draft_worthy(&self) -> bool {
        self.emotion.is_some()
            || self
                .content
                .as_deref()
                .is_some_and(|content| !content.trim().is_empty())
            || self.sleep_start.is_some()
            || self.sleep_end.is_some()
            || self
                .image_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty())
    }

    /// Copy every present field of `other` over this one, leaving the rest intact.
    pub fn overlay(&mut self, other: &Self) {
        if let Some(emotion) = other.emotion {
            self.emotion = Some(emotion);
        }
        if let Some(content) = &other.content {
            self.content = Some(content.clone());
        }
        if let Some(sleep_start) = other.sleep_start {
            self.sleep_start = Some(sleep_start);
        }
        if let Some(sleep_end) = other.sleep_end {
            self.sleep_end = Some(sleep_end);
        }
        if let Some(image_url) = &other.image_url {
            self.image_url = Some(image_url.clone());
        }
    }
}

/// An in-progress diary entry saved on this device, one per date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEntry {
    pub date: DiaryDate,
    #[serde(flatten)]
    pub fields: DraftFields,
    pub status: EntryStatus,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl DraftEntry {
    /// First line of the content, truncated to `max_len` characters
    #[must_use]
    pub fn content_preview(&self, max_len: usize) -> String {
        self.fields
            .content
            .as_deref()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}
