//! Draft repository implementation

use chrono::{DateTime, Utc};
use libsql::{params_from_iter, Connection, Row, Value};

use crate::error::{Error, Result};
use crate::models::{DiaryDate, DraftEntry, DraftFields, Emotion, EntryStatus};
use crate::util::unix_millis_now;

const DRAFT_COLUMNS: &str =
    "date, emotion, content, sleep_start, sleep_end, image_url, status, created_at, updated_at";

/// Trait for local draft storage operations (async)
#[allow(async_fn_in_trait)]
pub trait DraftRepository {
    /// Insert the draft for `date`, or replace its fields in place
    async fn upsert(
        &self,
        date: &DiaryDate,
        fields: &DraftFields,
        status: EntryStatus,
    ) -> Result<DraftEntry>;

    /// Check whether a draft exists for `date`
    async fn exists(&self, date: &DiaryDate) -> Result<bool>;

    /// Get the draft for `date`
    async fn fetch(&self, date: &DiaryDate) -> Result<Option<DraftEntry>>;

    /// Delete the draft for `date`, returning whether one existed
    async fn delete(&self, date: &DiaryDate) -> Result<bool>;

    /// Delete every draft created before `cutoff_ms`, returning the count
    async fn delete_created_before(&self, cutoff_ms: i64) -> Result<u64>;

    /// List drafts, most recently updated first
    async fn list(&self) -> Result<Vec<DraftEntry>>;
}

/// libSQL implementation of `DraftRepository`
pub struct LibSqlDraftRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlDraftRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Upsert with an explicit clock reading.
    ///
    /// `created_at` is only written on insert; `updated_at` never moves backwards.
    pub async fn upsert_at(
        &self,
        date: &DiaryDate,
        fields: &DraftFields,
        status: EntryStatus,
        now_ms: i64,
    ) -> Result<DraftEntry> {
        let values = vec![
            Value::Text(date.as_str()),
            text_value(fields.emotion.map(Emotion::as_str)),
            text_value(fields.content.as_deref()),
            integer_value(fields.sleep_start.map(|at| at.timestamp_millis())),
            integer_value(fields.sleep_end.map(|at| at.timestamp_millis())),
            text_value(fields.image_url.as_deref()),
            Value::Text(status.as_str().to_string()),
            Value::Integer(now_ms),
            Value::Integer(now_ms),
        ];

        self.conn
            .execute(
                "INSERT INTO drafts (date, emotion, content, sleep_start, sleep_end, image_url, status, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(date) DO UPDATE SET
                    emotion = excluded.emotion,
                    content = excluded.content,
                    sleep_start = excluded.sleep_start,
                    sleep_end = excluded.sleep_end,
                    image_url = excluded.image_url,
                    status = excluded.status,
                    updated_at = MAX(drafts.updated_at, excluded.updated_at)",
                params_from_iter(values),
            )
            .await?;

        self.fetch(date)
            .await?
            .ok_or_else(|| Error::LocalStorage(format!("Draft for {date} vanished after upsert")))
    }

    fn parse_draft(row: &Row) -> Result<DraftEntry> {
        let date: String = row.get(0)?;
        let emotion = optional_text(row, 1)?
            .map(|value| value.parse::<Emotion>())
            .transpose()?;
        let status: String = row.get(6)?;

        Ok(DraftEntry {
            date: date.parse()?,
            fields: DraftFields {
                emotion,
                content: optional_text(row, 2)?,
                sleep_start: optional_timestamp(row, 3)?,
                sleep_end: optional_timestamp(row, 4)?,
                image_url: optional_text(row, 5)?,
            },
            status: status.parse()?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl DraftRepository for LibSqlDraftRepository<'_> {
    async fn upsert(
        &self,
        date: &DiaryDate,
        fields: &DraftFields,
        status: EntryStatus,
    ) -> Result<DraftEntry> {
        self.upsert_at(date, fields, status, unix_millis_now()).await
    }

    async fn exists(&self, date: &DiaryDate) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT EXISTS(SELECT 1 FROM drafts WHERE date = ?)",
                [date.as_str()],
            )
            .await?;

        Ok(match rows.next().await? {
            Some(row) => row.get::<i32>(0)? != 0,
            None => false,
        })
    }

    async fn fetch(&self, date: &DiaryDate) -> Result<Option<DraftEntry>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {DRAFT_COLUMNS} FROM drafts WHERE date = ?"),
                [date.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_draft(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, date: &DiaryDate) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM drafts WHERE date = ?", [date.as_str()])
            .await?;
        Ok(rows > 0)
    }

    async fn delete_created_before(&self, cutoff_ms: i64) -> Result<u64> {
        let rows = self
            .conn
            .execute("DELETE FROM drafts WHERE created_at < ?", [cutoff_ms])
            .await?;
        Ok(rows)
    }

    async fn list(&self) -> Result<Vec<DraftEntry>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {DRAFT_COLUMNS} FROM drafts ORDER BY updated_at DESC, date DESC"),
                (),
            )
            .await?;

        let mut drafts = Vec::new();
        while let Some(row) = rows.next().await? {
            drafts.push(Self::parse_draft(&row)?);
        }
        Ok(drafts)
    }
}

fn text_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn integer_value(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

fn optional_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(Error::LocalStorage(format!(
            "Unexpected value in text column {idx}: {other:?}"
        ))),
    }
}

fn optional_timestamp(row: &Row, idx: i32) -> Result<Option<DateTime<Utc>>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Integer(millis) => DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| Error::LocalStorage(format!("Timestamp out of range: {millis}"))),
        other => Err(Error::LocalStorage(format!(
            "Unexpected value in timestamp column {idx}: {other:?}"
        ))),
    }
}
