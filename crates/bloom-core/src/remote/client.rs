//! HTTP client for the diary backend.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::config::{normalize_base_url, ClientConfig};
use crate::error::{Error, Result};
use crate::media::UploadTransport;
use crate::models::{
    CreatedEntry, DiaryDate, IssuedUpload, SubmissionRequest, TempDraftPayload, UploadUrlRequest,
};
use crate::util::compact_text;

use super::RemoteTempStore;

/// HTTP client for the diary REST backend.
///
/// Every call is a single attempt; timeouts come from [`ClientConfig`].
#[derive(Clone)]
pub struct DiaryApiClient {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for DiaryApiClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DiaryApiClient")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl DiaryApiClient {
    /// Build a client from configuration; fails when no base URL is configured.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let base_url = normalize_base_url(config.require_api_base_url()?)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|error| Error::Network(format!("Failed to construct HTTP client: {error}")))?;

        Ok(Self {
            base_url,
            access_token: config.api_token.clone(),
            client,
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reachability check against the backend root.
    ///
    /// Any HTTP response counts as reachable; only transport failures do not.
    pub async fn ping(&self) -> bool {
        self.client.head(&self.base_url).send().await.is_ok()
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/json");
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|error| Error::Network(format!("{action} request failed: {error}")))
    }

    async fn decode<T: for<'de> Deserialize<'de>>(response: Response, action: &str) -> Result<T> {
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|error| Error::Network(format!("Failed to read {action} response: {error}")))
    }
}

impl RemoteTempStore for DiaryApiClient {
    async fn exists_temp(&self, date: &DiaryDate) -> Result<bool> {
        let url = self.endpoint(&format!(
            "/v1/diaries/temp/exists?date={}",
            urlencoding::encode(&date.as_str())
        ));
        let response = self
            .send(self.authorized(self.client.get(url)), "Temp draft probe")
            .await?;
        let payload: ExistsResponse = Self::decode(response, "temp draft probe").await?;
        tracing::debug!(%date, exists = payload.exists, "Probed remote temp draft");
        Ok(payload.exists)
    }

    async fn fetch_temp(&self, date: &DiaryDate) -> Result<Option<TempDraftPayload>> {
        let url = self.endpoint(&format!(
            "/v1/diaries/temp?date={}",
            urlencoding::encode(&date.as_str())
        ));
        let response = self
            .send(self.authorized(self.client.get(url)), "Temp draft fetch")
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response, "temp draft").await.map(Some)
    }

    async fn create_entry(&self, request: &SubmissionRequest) -> Result<CreatedEntry> {
        let response = self
            .send(
                self.authorized(self.client.post(self.endpoint("/v1/diaries")).json(request)),
                "Create entry",
            )
            .await?;
        Self::decode(response, "create entry").await
    }
}

impl UploadTransport for DiaryApiClient {
    async fn issue_upload_url(&self, request: &UploadUrlRequest) -> Result<IssuedUpload> {
        let response = self
            .send(
                self.authorized(
                    self.client
                        .post(self.endpoint("/v1/images/upload-url"))
                        .json(request),
                ),
                "Upload URL",
            )
            .await?;
        Self::decode(response, "upload URL").await
    }

    async fn upload_bytes(&self, upload_url: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        // Presigned targets carry their own authorization
        let response = self
            .send(
                self.client
                    .put(upload_url)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(bytes.to_vec()),
                "Image upload",
            )
            .await?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

async fn server_error(response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    parse_api_error(status, &body)
}

fn parse_api_error(status: StatusCode, body: &str) -> Error {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return Error::Server {
                status: status.as_u16(),
                code: payload.code,
                message: compact_text(&message),
            };
        }
        if payload.code.is_some() {
            return Error::Server {
                status: status.as_u16(),
                code: payload.code,
                message: format!("HTTP {}", status.as_u16()),
            };
        }
    }

    let trimmed = body.trim();
    Error::Server {
        status: status.as_u16(),
        code: None,
        message: if trimmed.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            compact_text(trimmed)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ClientConfig {
        ClientConfig {
            api_base_url: Some(base_url.to_string()),
            api_token: Some("secret".to_string()),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn from_config_requires_base_url() {
        assert!(DiaryApiClient::from_config(&ClientConfig::default()).is_err());
    }

    #[test]
    fn from_config_trims_trailing_slash() {
        let client = DiaryApiClient::from_config(&config("https://api.example.com/")).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(
            client.endpoint("/v1/diaries"),
            "https://api.example.com/v1/diaries"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let client = DiaryApiClient::from_config(&config("https://api.example.com")).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn parse_api_error_reads_code_and_message() {
        let error = parse_api_error(
            StatusCode::UNAUTHORIZED,
            r#"{"code":"TOKEN_EXPIRED","message":"Access token expired"}"#,
        );
        match &error {
            Error::Server {
                status,
                code,
                message,
            } => {
                assert_eq!(*status, 401);
                assert_eq!(code.as_deref(), Some("TOKEN_EXPIRED"));
                assert_eq!(message, "Access token expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(error.requires_login());
    }

    #[test]
    fn parse_api_error_falls_back_to_raw_body() {
        let error = parse_api_error(StatusCode::BAD_GATEWAY, "  upstream down ");
        assert_eq!(error.to_string(), "Server error (502): upstream down");

        let empty = parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(empty.to_string(), "Server error (500): HTTP 500");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_backend_is_a_network_error() {
        // Port 9 (discard) on loopback refuses connections in test sandboxes
        let client = DiaryApiClient::from_config(&ClientConfig {
            connect_timeout: std::time::Duration::from_secs(1),
            request_timeout: std::time::Duration::from_secs(2),
            ..config("http://127.0.0.1:9")
        })
        .unwrap();

        let error = client
            .exists_temp(&"2025-07-20".parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Network(_)));
        assert!(!client.ping().await);
    }
}
