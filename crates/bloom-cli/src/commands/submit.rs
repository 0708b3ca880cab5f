use std::path::Path;

use bloom_core::config::ClientConfig;
use bloom_core::media::{ImageUploadCoordinator, UploadTransport};
use bloom_core::models::{CreatedEntry, ImageAttachment};
use bloom_core::remote::{DiaryApiClient, RemoteTempStore};
use bloom_core::services::DraftStore;
use bloom_core::session::{SaveReason, SessionHandle};
use bloom_core::submit::{SubmissionController, SubmitOutcome};
use bloom_core::{DiaryDate, EntryStatus, Error};

use crate::cli::FieldArgs;
use crate::commands::common::{fields_from_args, open_store};
use crate::error::CliError;

/// Everything `bloom submit` was asked to send.
#[derive(Debug, Clone)]
pub struct SubmitInput<'a> {
    pub date: DiaryDate,
    pub status: EntryStatus,
    pub fields: &'a FieldArgs,
    pub image: Option<&'a Path>,
    pub from_draft: bool,
}

pub async fn run_submit(
    input: SubmitInput<'_>,
    config: &ClientConfig,
    db_path: &Path,
) -> Result<CreatedEntry, CliError> {
    let client = DiaryApiClient::from_config(config)?;
    let store = open_store(db_path).await?;
    let controller =
        SubmissionController::new(client.clone(), ImageUploadCoordinator::new(client));
    submit_with(&controller, &store, input).await
}

/// Build a session from the local draft and flags, then submit it.
///
/// When the upload or create step fails the typed fields are merged into
/// the local draft for the date so nothing is lost.
pub async fn submit_with<R: RemoteTempStore, T: UploadTransport>(
    controller: &SubmissionController<R, T>,
    store: &DraftStore,
    input: SubmitInput<'_>,
) -> Result<CreatedEntry, CliError> {
    let session = SessionHandle::new(input.date);
    if input.from_draft {
        let entry = store
            .fetch(&input.date)
            .await?
            .ok_or_else(|| CliError::DraftNotFound(input.date.to_string()))?;
        session.apply_draft(&entry.fields, None).await;
    }
    session.apply_draft(&fields_from_args(input.fields), None).await;
    session.set_status(input.status).await;
    if let Some(path) = input.image {
        session.attach_image(ImageAttachment::from_path(path)?).await;
    }

    match controller.submit(&session).await {
        SubmitOutcome::Completed(entry) => {
            println!("Submitted {} entry for {}", entry.status, entry.date);
            if let Some(url) = &entry.image_url {
                println!("image: {url}");
            }
            Ok(entry)
        }
        SubmitOutcome::Rejected(missing) => Err(Error::Validation(missing).into()),
        SubmitOutcome::UploadFailed { message } | SubmitOutcome::CreateFailed { message, .. } => {
            match session.merge_into_draft(store, SaveReason::Manual).await {
                Ok(Some(_)) => println!("Kept your entry as a local draft for {}", input.date),
                Ok(None) => {}
                Err(error) => tracing::warn!("Could not keep local draft: {error}"),
            }
            Err(CliError::SubmissionFailed(message))
        }
        SubmitOutcome::Busy => Err(CliError::SubmissionFailed(
            "another submission is already in progress".to_string(),
        )),
    }
}
