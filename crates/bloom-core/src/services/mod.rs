//! Services shared across Bloom clients

mod draft_store;

pub use draft_store::DraftStore;
