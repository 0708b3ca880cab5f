//! Error types for bloom-core

use thiserror::Error;

use crate::models::RequiredField;

/// Result type alias using bloom-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Server error codes that must be escalated to the session layer.
const LOGIN_REQUIRED_CODES: [&str; 2] = ["AUTH_REQUIRED", "TOKEN_EXPIRED"];

/// Errors that can occur in bloom-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required fields are missing for the requested entry status
    #[error("Missing required fields: {}", join_fields(.0))]
    Validation(Vec<RequiredField>),

    /// Transport-level failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response from the diary backend
    #[error("Server error ({status}): {message}")]
    Server {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Local draft persistence failure
    #[error("Local storage error: {0}")]
    LocalStorage(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether the backend rejected the call because the session is no longer valid.
    pub fn requires_login(&self) -> bool {
        match self {
            Self::Server { status, code, .. } => {
                *status == 401
                    || code
                        .as_deref()
                        .is_some_and(|code| LOGIN_REQUIRED_CODES.contains(&code))
            }
            _ => false,
        }
    }

    /// Message suitable for showing to the person editing the entry.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(fields) => {
                format!("Please fill in: {}", join_fields(fields))
            }
            Self::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            Self::Server { message, .. } if self.requires_login() => {
                format!("Please sign in again. ({message})")
            }
            Self::Server { message, .. } => message.clone(),
            Self::LocalStorage(_) | Self::LibSql(_) | Self::Io(_) => {
                "Could not access the draft saved on this device.".to_string()
            }
            other => other.to_string(),
        }
    }
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(RequiredField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
