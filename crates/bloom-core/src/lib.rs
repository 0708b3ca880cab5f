//! bloom-core - Core library for Bloom
//!
//! This crate holds the diary draft pipeline shared by every Bloom client:
//! local draft persistence, the remote temp-draft client, connectivity
//! tracking, draft reconciliation, two-phase image upload, submission and
//! retention.

pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod reconcile;
pub mod remote;
pub mod retention;
pub mod services;
pub mod session;
pub mod submit;
pub mod util;

pub use error::{Error, Result};
pub use models::{DiaryDate, DraftEntry, DraftFields, Emotion, EntryStatus};
