//! Local draft database for Bloom

mod connection;
mod draft_repository;
mod migrations;

pub use connection::Database;
pub use draft_repository::{DraftRepository, LibSqlDraftRepository};
