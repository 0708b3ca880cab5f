use std::path::Path;

use bloom_core::config::ClientConfig;
use bloom_core::reconcile::{DraftOffer, DraftReconciler, RemoteAcceptance};
use bloom_core::remote::{DiaryApiClient, RemoteTempStore};
use bloom_core::util::unix_millis_now;
use bloom_core::DiaryDate;

use crate::commands::common::{format_fields, format_relative_time, open_store};
use crate::error::CliError;

pub async fn run_open(
    date: DiaryDate,
    accept: bool,
    config: &ClientConfig,
    db_path: &Path,
) -> Result<DraftOffer, CliError> {
    let client = DiaryApiClient::from_config(config)?;
    let store = open_store(db_path).await?;
    open_with(&DraftReconciler::new(store, client), date, accept).await
}

/// Probe for a draft and, when asked, restore it into a fresh session.
pub async fn open_with<R: RemoteTempStore>(
    reconciler: &DraftReconciler<R>,
    date: DiaryDate,
    accept: bool,
) -> Result<DraftOffer, CliError> {
    let (session, offer) = reconciler.begin(date).await;

    match &offer {
        DraftOffer::Local(entry) => {
            println!(
                "Found a local draft for {date} (saved {})",
                format_relative_time(entry.updated_at, unix_millis_now())
            );
            if accept {
                reconciler.accept_local(&session, entry).await;
            }
        }
        DraftOffer::Remote => {
            println!("Server has a temporary draft for {date}");
            if accept {
                match reconciler.accept_remote(&session).await {
                    RemoteAcceptance::Applied => {}
                    RemoteAcceptance::Missing => {
                        println!("The server draft is no longer available");
                    }
                    RemoteAcceptance::Failed { message } => {
                        return Err(CliError::RemoteDraft(message));
                    }
                }
            }
        }
        DraftOffer::Empty => println!("No draft for {date}; starting fresh"),
    }

    if accept {
        let snapshot = session.snapshot().await;
        println!("status: {}", snapshot.status);
        for line in format_fields(&snapshot.fields) {
            println!("{line}");
        }
    }
    Ok(offer)
}
