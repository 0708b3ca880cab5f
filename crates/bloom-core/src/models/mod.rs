//! Data models for Bloom

mod draft;
mod submission;
mod upload;

pub use draft::{DiaryDate, DraftEntry, DraftFields, Emotion};
pub use submission::{
    CreatedEntry, EntryStatus, RequiredField, SubmissionRequest, TempDraftPayload,
};
pub use upload::{ImageAttachment, IssuedUpload, UploadCategory, UploadUrlRequest};
