use std::path::PathBuf;

use bloom_core::{DiaryDate, Emotion, EntryStatus};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::commands::common::{parse_date, parse_emotion, parse_timestamp};

#[derive(Parser)]
#[command(name = "bloom")]
#[command(about = "Keep diary drafts safe and submit finished entries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local draft database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage drafts saved on this device
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },
    /// Delete local drafts older than the retention window
    Sweep {
        /// Retention window in days (defaults to BLOOM_RETENTION_DAYS or 30)
        #[arg(long, value_name = "N")]
        days: Option<u32>,
    },
    /// Start editing a date and report which draft would be offered
    Open {
        /// Diary date (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        date: DiaryDate,
        /// Accept the offered draft and print the restored fields
        #[arg(long)]
        accept: bool,
    },
    /// Submit a diary entry to the server
    Submit {
        /// Diary date (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        date: DiaryDate,
        /// Entry status
        #[arg(long, value_enum, default_value_t = StatusArg::Normal)]
        status: StatusArg,
        #[command(flatten)]
        fields: FieldArgs,
        /// Image file to upload with the entry
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Start from the local draft for this date
        #[arg(long)]
        from_draft: bool,
    },
}

impl Commands {
    /// Whether the command talks to the diary backend.
    pub const fn requires_remote(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Submit { .. })
    }
}

#[derive(Subcommand)]
pub enum DraftCommands {
    /// Save a draft for a date
    Save {
        /// Diary date (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        date: DiaryDate,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Show the draft for a date
    Show {
        /// Diary date (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        date: DiaryDate,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the draft for a date
    Delete {
        /// Diary date (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        date: DiaryDate,
    },
    /// List local drafts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Entry fields shared by `draft save` and `submit`.
#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// Mood for the day (JOY, CALM, NEUTRAL, SAD, ANGRY, ANXIOUS, TIRED)
    #[arg(long, value_parser = parse_emotion)]
    pub emotion: Option<Emotion>,
    /// Entry text
    #[arg(long)]
    pub content: Option<String>,
    /// Bedtime (RFC 3339)
    #[arg(long, value_name = "TIME", value_parser = parse_timestamp)]
    pub sleep_start: Option<DateTime<Utc>>,
    /// Wake-up time (RFC 3339)
    #[arg(long, value_name = "TIME", value_parser = parse_timestamp)]
    pub sleep_end: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Normal,
    Temp,
}

impl From<StatusArg> for EntryStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Normal => Self::Normal,
            StatusArg::Temp => Self::Temp,
        }
    }
}
