//! Remote Subtitle Providers
//!
//! One client per remote catalogue, all behind [`SubtitleProvider`]:
//! - OpenSubtitles - free-text title search
//! - YIFY - lookup by IMDb id
//! - Podnapisi - keyword search over an aggregated JSON index
//!
//! Clients return typed errors. Turning a failing source into an empty
//! contribution is the aggregator's job.

pub mod opensubtitles;
pub mod podnapisi;
pub mod yify;

#[cfg(test)]
pub(crate) mod stub;

pub use core_runtime::config::ProviderEndpoints;
pub use opensubtitles::OpenSubtitlesClient;
pub use podnapisi::PodnapisiClient;
pub use yify::YifyClient;

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, SubtitleError};
use crate::types::{SubtitleQuery, SubtitleSource, SubtitleTrack};

/// A remote catalogue that can list and serve subtitle files.
#[async_trait]
pub trait SubtitleProvider: Send + Sync {
    /// Source tag stamped on every track this provider returns.
    fn source(&self) -> SubtitleSource;

    /// List candidate tracks for `query`.
    async fn search_subtitles(&self, query: &SubtitleQuery) -> Result<Vec<SubtitleTrack>>;

    /// Fetch the raw subtitle text behind `track.url`.
    async fn download_subtitle(&self, track: &SubtitleTrack) -> Result<String>;
}

/// Shared request plumbing for provider clients.
///
/// Every request carries an explicit timeout and user agent. Transport and
/// status failures are mapped onto [`SubtitleError`] in one place.
#[derive(Clone)]
pub struct ProviderHttp {
    client: Arc<dyn HttpClient>,
    timeout: Duration,
    user_agent: String,
}

impl ProviderHttp {
    pub fn new(client: Arc<dyn HttpClient>, timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            timeout,
            user_agent: user_agent.into(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `GET url`, failing on any non-2xx status.
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        let request = HttpRequest::get(url)
            .user_agent(self.user_agent.as_str())
            .header("Accept", "application/json, text/plain, */*")
            .timeout(self.timeout);

        let response = self.client.execute(request).await.map_err(|e| {
            let err = SubtitleError::from(e);
            warn!(url, error = %err, "Provider request failed");
            err
        })?;

        match response.status {
            status if (200..300).contains(&status) => Ok(response),
            404 => {
                debug!(url, "Provider returned 404");
                Err(SubtitleError::SourceNotFound(url.to_string()))
            }
            status => {
                warn!(url, status, "Provider returned error status");
                Err(SubtitleError::HttpStatus {
                    status,
                    url: url.to_string(),
                })
            }
        }
    }

    /// `GET url` and decode the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url).await?;
        serde_json::from_slice(&response.body).map_err(|e| {
            warn!(url, error = %e, "Provider response did not match expected schema");
            SubtitleError::Decode(format!("{}: {}", url, e))
        })
    }

    /// `GET url` and return the body as text. Invalid UTF-8 sequences are
    /// replaced rather than rejected.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        Ok(String::from_utf8_lossy(&response.body).into_owned())
    }
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::stub::StubHttpClient;
    use super::*;
    use bridge_traits::error::BridgeError;

    fn http(stub: &Arc<StubHttpClient>) -> ProviderHttp {
        ProviderHttp::new(stub.clone(), Duration::from_secs(3), "subtitle-core-test")
    }

    #[tokio::test]
    async fn test_request_carries_timeout_and_user_agent() {
        let stub = Arc::new(StubHttpClient::new().respond("https://subs.example/a", 200, "ok"));

        let body = http(&stub).get_text("https://subs.example/a").await.unwrap();
        assert_eq!(body, "ok");

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(3)));
        assert_eq!(
            requests[0].headers.get("User-Agent").map(String::as_str),
            Some("subtitle-core-test")
        );
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let stub = Arc::new(
            StubHttpClient::new()
                .respond("https://subs.example/missing", 404, "")
                .respond("https://subs.example/broken", 503, ""),
        );
        let http = http(&stub);

        assert!(matches!(
            http.get("https://subs.example/missing").await,
            Err(SubtitleError::SourceNotFound(_))
        ));
        assert!(matches!(
            http.get("https://subs.example/broken").await,
            Err(SubtitleError::HttpStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_failures_are_classified() {
        let stub = Arc::new(
            StubHttpClient::new()
                .fail("https://subs.example/slow", BridgeError::Timeout("3s".into()))
                .fail(
                    "https://subs.example/down",
                    BridgeError::ConnectionFailed("refused".into()),
                ),
        );
        let http = http(&stub);

        let err = http.get("https://subs.example/slow").await.unwrap_err();
        assert!(matches!(err, SubtitleError::Timeout(_)));

        let err = http.get("https://subs.example/down").await.unwrap_err();
        assert!(matches!(err, SubtitleError::Network(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_bad_json_is_decode_error() {
        let stub = Arc::new(StubHttpClient::new().respond("https://subs.example/j", 200, "<html>"));
        let result: Result<Vec<u32>> = http(&stub).get_json("https://subs.example/j").await;
        assert!(matches!(result, Err(SubtitleError::Decode(_))));
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(endpoint("https://a.example/api/", "/search"), "https://a.example/api/search");
        assert_eq!(endpoint("https://a.example", "x/y"), "https://a.example/x/y");
    }
}
