//! Attachment API HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header};
use tracing::{debug, warn};

use super::dto::{AttachmentPage, AttachmentQuery, ErrorResponse};
use crate::domain::errors::SourceError;
use crate::domain::ports::{AttachmentSourcePort, FetchRequest, FetchResponse};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_AFTER_MS: u64 = 5000;

/// Fetches attachment pages from the chat API.
pub struct HttpAttachmentSource {
    client: Client,
    base_url: Url,
}

impl HttpAttachmentSource {
    /// Creates a client for `base_url` with the default timeout.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client with an explicit request timeout.
    ///
    /// # Errors
    /// Returns error if `base_url` is not an absolute http(s) URL or HTTP
    /// client creation fails.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| SourceError::decode(format!("invalid API base URL: {base_url}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Endpoint listing a channel's attachments. Ids are percent-encoded as
    /// path segments.
    #[must_use]
    pub fn attachments_url(&self, request: &FetchRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "clans",
                request.clan_id.as_str(),
                "channels",
                request.channel_id.as_str(),
                "attachments",
            ]);
        }
        url
    }

    async fn handle_error_response(status: StatusCode, response: reqwest::Response) -> SourceError {
        let retry_after_ms = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000));

        let error_message = match response.json::<ErrorResponse>().await {
            Ok(error) => error.message,
            Err(_) => format!("HTTP {status}"),
        };

        map_status(status, error_message, retry_after_ms)
    }
}

/// Maps a non-success status to a source error.
fn map_status(status: StatusCode, message: String, retry_after_ms: Option<u64>) -> SourceError {
    match status {
        StatusCode::UNAUTHORIZED => SourceError::rejected(status.as_u16(), "invalid or expired session"),
        StatusCode::FORBIDDEN => {
            SourceError::rejected(status.as_u16(), format!("access denied: {message}"))
        }
        StatusCode::NOT_FOUND => {
            SourceError::rejected(status.as_u16(), format!("channel not found: {message}"))
        }
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited {
            retry_after_ms: retry_after_ms.unwrap_or(DEFAULT_RETRY_AFTER_MS),
        },
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            SourceError::network("attachment API is temporarily unavailable")
        }
        _ => SourceError::rejected(
            status.as_u16(),
            format!("unexpected response: {status} - {message}"),
        ),
    }
}

#[async_trait]
impl AttachmentSourcePort for HttpAttachmentSource {
    async fn fetch_attachments(
        &self,
        request: &FetchRequest,
    ) -> Result<FetchResponse, SourceError> {
        let url = self.attachments_url(request);

        debug!(
            url = %url,
            limit = request.limit,
            before = ?request.before,
            after = ?request.after,
            "Fetching attachment page"
        );

        let response = self
            .client
            .get(url)
            .query(&AttachmentQuery::from(request))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to reach attachment API");
                if e.is_timeout() {
                    SourceError::network("request timed out")
                } else if e.is_connect() {
                    SourceError::network("failed to connect to attachment API")
                } else {
                    SourceError::network(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            return Err(Self::handle_error_response(status, response).await);
        }

        let page: AttachmentPage = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse attachment page");
            SourceError::decode(format!("failed to parse response: {e}"))
        })?;

        let attachments = page.into_attachments();
        debug!(returned = attachments.len(), "Attachment page received");

        Ok(FetchResponse::new(attachments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ChannelKey;
    use test_case::test_case;

    #[test]
    fn test_attachments_url_trims_trailing_slash() {
        let source = HttpAttachmentSource::new("https://api.example.com/v2/").unwrap();
        let request = FetchRequest::initial(&ChannelKey::new("c1", "ch9"), 50);

        assert_eq!(
            source.attachments_url(&request).as_str(),
            "https://api.example.com/v2/clans/c1/channels/ch9/attachments"
        );
    }

    #[test]
    fn test_attachments_url_encodes_ids() {
        let source = HttpAttachmentSource::new("https://api.example.com").unwrap();
        let request = FetchRequest::initial(&ChannelKey::new("a/b", "c?d#e f"), 50);

        assert_eq!(
            source.attachments_url(&request).as_str(),
            "https://api.example.com/clans/a%2Fb/channels/c%3Fd%23e%20f/attachments"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(HttpAttachmentSource::new("not a url").is_err());
        assert!(HttpAttachmentSource::new("mailto:someone@example.com").is_err());
    }

    #[test_case(StatusCode::UNAUTHORIZED, false ; "unauthorized")]
    #[test_case(StatusCode::FORBIDDEN, false ; "forbidden")]
    #[test_case(StatusCode::NOT_FOUND, false ; "not found")]
    #[test_case(StatusCode::TOO_MANY_REQUESTS, true ; "rate limited")]
    #[test_case(StatusCode::SERVICE_UNAVAILABLE, true ; "unavailable")]
    #[test_case(StatusCode::IM_A_TEAPOT, false ; "unexpected")]
    fn test_status_mapping_recoverability(status: StatusCode, recoverable: bool) {
        let error = map_status(status, "boom".to_string(), None);
        assert_eq!(error.is_recoverable(), recoverable);
    }

    #[test]
    fn test_rate_limit_uses_retry_after() {
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, String::new(), Some(2000)),
            SourceError::RateLimited {
                retry_after_ms: 2000
            }
        );
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, String::new(), None),
            SourceError::RateLimited {
                retry_after_ms: DEFAULT_RETRY_AFTER_MS
            }
        );
    }

    #[test]
    fn test_rejected_keeps_status() {
        let error = map_status(StatusCode::FORBIDDEN, "no access".to_string(), None);
        assert!(matches!(error, SourceError::Rejected { status: 403, .. }));
        assert!(error.to_string().contains("no access"));
    }
}
