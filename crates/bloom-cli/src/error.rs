use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] bloom_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Nothing to save: provide at least one field")]
    EmptyDraft,
    #[error("No local draft for {0}")]
    DraftNotFound(String),
    #[error("Could not resolve a data directory; pass --db-path or set BLOOM_DB_PATH")]
    NoDataDir,
    #[error("Could not load the server draft: {0}")]
    RemoteDraft(String),
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),
}
