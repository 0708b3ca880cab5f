//! Client configuration for Bloom.
//!
//! Values come from environment variables so that the CLI and embedding
//! shells can share one source of truth. Parsing is a pure function over a
//! lookup closure so it can be exercised without touching the process env.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

const ENV_API_BASE_URL: &str = "BLOOM_API_BASE_URL";
const ENV_API_TOKEN: &str = "BLOOM_API_TOKEN";
const ENV_DB_PATH: &str = "BLOOM_DB_PATH";
const ENV_HTTP_TIMEOUT_SECS: &str = "BLOOM_HTTP_TIMEOUT_SECS";
const ENV_HTTP_CONNECT_TIMEOUT_SECS: &str = "BLOOM_HTTP_CONNECT_TIMEOUT_SECS";
const ENV_RETENTION_DAYS: &str = "BLOOM_RETENTION_DAYS";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Runtime configuration shared by Bloom clients.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Diary backend base URL, without trailing slash.
    pub api_base_url: Option<String>,
    /// Bearer token forwarded to the backend. Issued elsewhere.
    pub api_token: Option<String>,
    /// Explicit local draft database path.
    pub db_path: Option<PathBuf>,
    /// Upper bound for a whole HTTP request.
    pub request_timeout: Duration,
    /// Upper bound for establishing a connection.
    pub connect_timeout: Duration,
    /// Age after which local drafts are swept.
    pub retention_days: u32,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("db_path", &self.db_path)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("retention_days", &self.retention_days)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            db_path: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        parse_config(|key| env::var(key).ok())
    }

    /// Load only the on-device settings; remote settings keep their defaults.
    pub fn local_from_env() -> Result<Self> {
        parse_local_config(|key| env::var(key).ok())
    }

    /// Backend base URL, or an error naming the variable to set.
    pub fn require_api_base_url(&self) -> Result<&str> {
        self.api_base_url.as_deref().ok_or_else(|| {
            Error::InvalidInput(format!(
                "{ENV_API_BASE_URL} is not set; remote draft and submission features are unavailable"
            ))
        })
    }
}

/// Parse configuration from an arbitrary key lookup.
pub fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<ClientConfig> {
    let local = parse_local_config(&lookup)?;
    let api_base_url = normalize_text_option(lookup(ENV_API_BASE_URL))
        .map(|url| normalize_base_url(&url))
        .transpose()?;
    let api_token = normalize_text_option(lookup(ENV_API_TOKEN));

    let request_timeout = parse_secs(&lookup, ENV_HTTP_TIMEOUT_SECS)?
        .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);
    let connect_timeout = parse_secs(&lookup, ENV_HTTP_CONNECT_TIMEOUT_SECS)?
        .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs);

    Ok(ClientConfig {
        api_base_url,
        api_token,
        request_timeout,
        connect_timeout,
        ..local
    })
}

/// Parse only the settings the local draft store needs.
///
/// Backend settings are not read, so a malformed URL or timeout does not
/// affect commands that never talk to the server.
pub fn parse_local_config(lookup: impl Fn(&str) -> Option<String>) -> Result<ClientConfig> {
    let db_path = normalize_text_option(lookup(ENV_DB_PATH)).map(PathBuf::from);
    let retention_days = match normalize_text_option(lookup(ENV_RETENTION_DAYS)) {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            Error::InvalidInput(format!(
                "{ENV_RETENTION_DAYS} must be a whole number of days, got '{raw}'"
            ))
        })?,
        None => DEFAULT_RETENTION_DAYS,
    };

    Ok(ClientConfig {
        db_path,
        retention_days,
        ..ClientConfig::default()
    })
}

/// Trim and validate an API base URL.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(Error::InvalidInput(
            "API base URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(&base) {
        return Err(Error::InvalidInput(
            "API base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base)
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = normalize_text_option(lookup(key)) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(Error::InvalidInput(format!(
            "{key} must be a positive number of seconds, got '{raw}'"
        ))),
        Ok(secs) => Ok(Some(secs)),
    }
}
