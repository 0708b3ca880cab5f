//! Validating and submitting a finished diary entry.
//!
//! One submission runs at a time per controller. The flow is
//! `Validating -> (Rejected | Uploading) -> (UploadFailed | Creating) ->
//! (CreateFailed | Completed)`, with the upload step skipped when no image
//! is attached. Failures never discard what was typed.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::media::{ImageUploadCoordinator, UploadTransport};
use crate::models::{
    CreatedEntry, DiaryDate, DraftFields, EntryStatus, RequiredField, SubmissionRequest,
};
use crate::remote::RemoteTempStore;
use crate::session::SessionHandle;

/// Fields missing for `status`, all of them, in a fixed order.
///
/// Normal entries need every field except the image; Temp entries only
/// need a date.
pub fn validate(
    status: EntryStatus,
    date: Option<&DiaryDate>,
    fields: &DraftFields,
) -> Vec<RequiredField> {
    let mut missing = Vec::new();
    if date.is_none() {
        missing.push(RequiredField::Date);
    }
    if status == EntryStatus::Temp {
        return missing;
    }

    if fields.emotion.is_none() {
        missing.push(RequiredField::Emotion);
    }
    if !fields
        .content
        .as_deref()
        .is_some_and(|content| !content.trim().is_empty())
    {
        missing.push(RequiredField::Content);
    }
    if fields.sleep_start.is_none() {
        missing.push(RequiredField::SleepStart);
    }
    if fields.sleep_end.is_none() {
        missing.push(RequiredField::SleepEnd);
    }
    missing
}

/// Observable progress of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Validating,
    Rejected(Vec<RequiredField>),
    Uploading,
    UploadFailed(String),
    Creating,
    CreateFailed(String),
    Completed(CreatedEntry),
}

/// Result of one `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submission was already in flight; nothing was done
    Busy,
    Rejected(Vec<RequiredField>),
    UploadFailed { message: String },
    CreateFailed { message: String, requires_login: bool },
    Completed(CreatedEntry),
}

impl SubmitOutcome {
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Clears the in-flight flag however the submission future ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SubmissionController<R, T> {
    remote: R,
    uploader: ImageUploadCoordinator<T>,
    busy: AtomicBool,
    state: watch::Sender<SubmitState>,
}

impl<R: RemoteTempStore, T: UploadTransport> SubmissionController<R, T> {
    pub fn new(remote: R, uploader: ImageUploadCoordinator<T>) -> Self {
        let (state, _rx) = watch::channel(SubmitState::Idle);
        Self {
            remote,
            uploader,
            busy: AtomicBool::new(false),
            state,
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmitState> {
        self.state.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn transition(&self, next: SubmitState) {
        tracing::debug!(state = ?next, "Submission state");
        self.state.send_replace(next);
    }

    /// Validate, upload the image if any, then create the entry.
    ///
    /// On success the session is marked completed and its fields cleared.
    /// The local draft record for the date is left in place.
    pub async fn submit(&self, session: &SessionHandle) -> SubmitOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!(date = %session.date(), "Submission already in flight");
            return SubmitOutcome::Busy;
        };

        self.transition(SubmitState::Validating);
        let snapshot = session.snapshot().await;
        let missing = validate(snapshot.status, Some(&snapshot.date), &snapshot.fields);
        if !missing.is_empty() {
            tracing::info!(date = %snapshot.date, ?missing, "Submission rejected");
            self.transition(SubmitState::Rejected(missing.clone()));
            return SubmitOutcome::Rejected(missing);
        }

        let image_url = match &snapshot.image {
            Some(image) => {
                self.transition(SubmitState::Uploading);
                match self.uploader.upload(image).await {
                    Ok(access_url) => Some(access_url),
                    Err(error) => {
                        let message = error.user_message();
                        self.transition(SubmitState::UploadFailed(message.clone()));
                        return SubmitOutcome::UploadFailed { message };
                    }
                }
            }
            None => snapshot.fields.image_url.clone(),
        };

        self.transition(SubmitState::Creating);
        let request = SubmissionRequest::assemble(
            snapshot.date,
            snapshot.status,
            &snapshot.fields,
            image_url,
        );
        match self.remote.create_entry(&request).await {
            Ok(entry) => {
                session.complete().await;
                tracing::info!(
                    date = %snapshot.date,
                    status = %snapshot.status,
                    "Diary entry submitted"
                );
                self.transition(SubmitState::Completed(entry.clone()));
                SubmitOutcome::Completed(entry)
            }
            Err(error) => {
                tracing::warn!(date = %snapshot.date, "Create entry failed: {error}");
                let message = error.user_message();
                self.transition(SubmitState::CreateFailed(message.clone()));
                SubmitOutcome::CreateFailed {
                    message,
                    requires_login: error.requires_login(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Emotion, ImageAttachment, IssuedUpload, TempDraftPayload, UploadUrlRequest,
    };
    use crate::services::DraftStore;
    use crate::{Error, Result};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct FakeBackend {
        log: Arc<Mutex<Vec<String>>>,
        requests: Arc<Mutex<Vec<SubmissionRequest>>>,
        create_delay: Option<Duration>,
        fail_issue: bool,
        fail_transfer: bool,
        fail_create: bool,
    }

    impl FakeBackend {
        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        fn requests(&self) -> Vec<SubmissionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl RemoteTempStore for FakeBackend {
        async fn exists_temp(&self, _date: &DiaryDate) -> Result<bool> {
            Ok(false)
        }

        async fn fetch_temp(&self, _date: &DiaryDate) -> Result<Option<TempDraftPayload>> {
            Ok(None)
        }

        async fn create_entry(&self, request: &SubmissionRequest) -> Result<CreatedEntry> {
            self.log.lock().unwrap().push("create".to_string());
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.create_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_create {
                return Err(Error::Server {
                    status: 500,
                    code: None,
                    message: "Something went wrong".to_string(),
                });
            }
            Ok(CreatedEntry {
                id: Some(7),
                date: request.date,
                status: request.status,
                image_url: request.image_url.clone(),
            })
        }
    }

    impl UploadTransport for FakeBackend {
        async fn issue_upload_url(&self, _request: &UploadUrlRequest) -> Result<IssuedUpload> {
            self.log.lock().unwrap().push("issue".to_string());
            if self.fail_issue {
                return Err(Error::Network("timed out".to_string()));
            }
            Ok(IssuedUpload {
                upload_url: "https://bucket.example.com/put/x.png".to_string(),
                access_url: "https://cdn.example.com/x.png".to_string(),
            })
        }

        async fn upload_bytes(
            &self,
            _upload_url: &str,
            _bytes: &[u8],
            _content_type: &str,
        ) -> Result<()> {
            self.log.lock().unwrap().push("transfer".to_string());
            if self.fail_transfer {
                return Err(Error::Network("connection reset".to_string()));
            }
            Ok(())
        }
    }

    fn controller(backend: &FakeBackend) -> SubmissionController<FakeBackend, FakeBackend> {
        SubmissionController::new(backend.clone(), ImageUploadCoordinator::new(backend.clone()))
    }

    fn date() -> DiaryDate {
        "2025-07-20".parse().unwrap()
    }

    fn complete_fields() -> DraftFields {
        DraftFields {
            emotion: Some(Emotion::Joy),
            content: Some("Picnic by the river".to_string()),
            sleep_start: Some(Utc.with_ymd_and_hms(2025, 7, 19, 23, 0, 0).unwrap()),
            sleep_end: Some(Utc.with_ymd_and_hms(2025, 7, 20, 7, 0, 0).unwrap()),
            image_url: None,
        }
    }

    async fn complete_session() -> SessionHandle {
        let session = SessionHandle::new(date());
        session.edit(|fields| *fields = complete_fields()).await;
        session
    }

    fn image() -> ImageAttachment {
        ImageAttachment::new("river.png", "image/png", vec![9; 16]).unwrap()
    }

    #[test]
    fn normal_with_all_fields_passes() {
        assert!(validate(EntryStatus::Normal, Some(&date()), &complete_fields()).is_empty());
    }

    #[test]
    fn normal_without_date_reports_date() {
        assert_eq!(
            validate(EntryStatus::Normal, None, &complete_fields()),
            vec![RequiredField::Date]
        );
    }

    #[test]
    fn normal_without_emotion_reports_emotion() {
        let fields = DraftFields {
            emotion: None,
            ..complete_fields()
        };
        assert_eq!(
            validate(EntryStatus::Normal, Some(&date()), &fields),
            vec![RequiredField::Emotion]
        );
    }

    #[test]
    fn normal_with_blank_content_reports_content() {
        let fields = DraftFields {
            content: Some("   ".to_string()),
            ..complete_fields()
        };
        assert_eq!(
            validate(EntryStatus::Normal, Some(&date()), &fields),
            vec![RequiredField::Content]
        );
    }

    #[test]
    fn normal_without_sleep_start_reports_sleep_start() {
        let fields = DraftFields {
            sleep_start: None,
            ..complete_fields()
        };
        assert_eq!(
            validate(EntryStatus::Normal, Some(&date()), &fields),
            vec![RequiredField::SleepStart]
        );
    }

    #[test]
    fn normal_without_sleep_end_reports_sleep_end() {
        let fields = DraftFields {
            sleep_end: None,
            ..complete_fields()
        };
        assert_eq!(
            validate(EntryStatus::Normal, Some(&date()), &fields),
            vec![RequiredField::SleepEnd]
        );
    }

    #[test]
    fn normal_collects_every_missing_field() {
        assert_eq!(
            validate(EntryStatus::Normal, None, &DraftFields::default()),
            vec![
                RequiredField::Date,
                RequiredField::Emotion,
                RequiredField::Content,
                RequiredField::SleepStart,
                RequiredField::SleepEnd,
            ]
        );
    }

    #[test]
    fn temp_with_only_date_passes() {
        assert!(validate(EntryStatus::Temp, Some(&date()), &DraftFields::default()).is_empty());
        assert_eq!(
            validate(EntryStatus::Temp, None, &DraftFields::default()),
            vec![RequiredField::Date]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn complete_entry_without_image_creates_once_with_null_image() {
        let backend = FakeBackend::default();
        let controller = controller(&backend);
        let session = complete_session().await;

        let outcome = controller.submit(&session).await;

        assert!(outcome.is_completed());
        assert_eq!(backend.log(), vec!["create"]);
        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].image_url, None);
        assert_eq!(requests[0].status, EntryStatus::Normal);
        assert!(session.is_completed().await);
        assert_eq!(session.snapshot().await.fields, DraftFields::default());
        assert!(matches!(controller.state(), SubmitState::Completed(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_transfer_never_creates_and_keeps_fields() {
        let backend = FakeBackend {
            fail_transfer: true,
            ..FakeBackend::default()
        };
        let controller = controller(&backend);
        let session = complete_session().await;
        session.attach_image(image()).await;

        let outcome = controller.submit(&session).await;

        assert!(matches!(outcome, SubmitOutcome::UploadFailed { .. }));
        assert_eq!(backend.log(), vec!["issue", "transfer"]);
        assert!(backend.requests().is_empty());
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.fields, complete_fields());
        assert!(snapshot.image.is_some());
        assert!(!snapshot.completed);
        assert!(matches!(controller.state(), SubmitState::UploadFailed(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_issue_skips_transfer_and_create() {
        let backend = FakeBackend {
            fail_issue: true,
            ..FakeBackend::default()
        };
        let controller = controller(&backend);
        let session = complete_session().await;
        session.attach_image(image()).await;

        let outcome = controller.submit(&session).await;

        assert!(matches!(outcome, SubmitOutcome::UploadFailed { .. }));
        assert_eq!(backend.log(), vec!["issue"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn image_upload_precedes_create_and_passes_access_url() {
        let backend = FakeBackend::default();
        let controller = controller(&backend);
        let session = complete_session().await;
        session.attach_image(image()).await;

        let outcome = controller.submit(&session).await;

        assert!(outcome.is_completed());
        assert_eq!(backend.log(), vec!["issue", "transfer", "create"]);
        assert_eq!(
            backend.requests()[0].image_url.as_deref(),
            Some("https://cdn.example.com/x.png")
        );
        assert!(session.snapshot().await.image.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_submission_calls_nothing() {
        let backend = FakeBackend::default();
        let controller = controller(&backend);
        let session = SessionHandle::new(date());
        session
            .edit(|fields| fields.content = Some("only words".to_string()))
            .await;

        let outcome = controller.submit(&session).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Rejected(vec![
                RequiredField::Emotion,
                RequiredField::SleepStart,
                RequiredField::SleepEnd,
            ])
        );
        assert!(backend.log().is_empty());
        assert!(!controller.is_busy());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subscribers_observe_final_state() {
        let backend = FakeBackend::default();
        let controller = controller(&backend);
        let mut rx = controller.subscribe();
        assert_eq!(*rx.borrow_and_update(), SubmitState::Idle);

        controller.submit(&SessionHandle::new(date())).await;

        assert!(rx.has_changed().unwrap());
        assert!(matches!(
            &*rx.borrow_and_update(),
            SubmitState::Rejected(missing) if missing.len() == 4
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn temp_submission_needs_only_date() {
        let backend = FakeBackend::default();
        let controller = controller(&backend);
        let session = SessionHandle::new(date());
        session.set_status(EntryStatus::Temp).await;

        let outcome = controller.submit(&session).await;

        assert!(outcome.is_completed());
        assert_eq!(backend.requests()[0].status, EntryStatus::Temp);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_submit_while_in_flight_is_ignored() {
        let backend = FakeBackend {
            create_delay: Some(Duration::from_millis(50)),
            ..FakeBackend::default()
        };
        let controller = controller(&backend);
        let session = complete_session().await;

        let (first, second) = tokio::join!(controller.submit(&session), async {
            // Let the first call reach the network step
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.submit(&session).await
        });

        assert!(first.is_completed());
        assert_eq!(second, SubmitOutcome::Busy);
        assert_eq!(backend.requests().len(), 1);
        assert!(!controller.is_busy());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_create_preserves_fields_for_retry() {
        let backend = FakeBackend {
            fail_create: true,
            ..FakeBackend::default()
        };
        let controller = controller(&backend);
        let session = complete_session().await;

        let outcome = controller.submit(&session).await;
        let retry = controller.submit(&session).await;

        assert_eq!(
            outcome,
            SubmitOutcome::CreateFailed {
                message: "Something went wrong".to_string(),
                requires_login: false,
            }
        );
        assert!(matches!(retry, SubmitOutcome::CreateFailed { .. }));
        assert_eq!(backend.requests().len(), 2);
        assert_eq!(session.snapshot().await.fields, complete_fields());
        assert!(!session.is_completed().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn successful_submit_keeps_local_draft_record() {
        let store = DraftStore::open_in_memory().await.unwrap();
        let backend = FakeBackend::default();
        let controller = controller(&backend);
        let session = complete_session().await;
        session
            .save_draft(&store, crate::session::SaveReason::Manual)
            .await
            .unwrap();

        assert!(controller.submit(&session).await.is_completed());

        assert!(store.exists(&date()).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dropped_submission_releases_busy_flag() {
        let backend = FakeBackend {
            create_delay: Some(Duration::from_secs(5)),
            ..FakeBackend::default()
        };
        let controller = controller(&backend);
        let session = complete_session().await;

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), controller.submit(&session)).await;

        assert!(abandoned.is_err());
        assert!(!controller.is_busy());
    }
}
