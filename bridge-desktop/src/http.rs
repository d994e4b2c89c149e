//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const DEFAULT_USER_AGENT: &str = concat!("subtitle-core/", env!("CARGO_PKG_VERSION"));

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection pooling via reqwest
/// - Automatic retry with exponential backoff on 5xx/429
/// - A client-wide timeout, overridable per request
/// - Timeout/connect failures classified into [`BridgeError::Timeout`] and
///   [`BridgeError::ConnectionFailed`]
pub struct ReqwestHttpClient {
    client: Client,
    retry_policy: RetryPolicy,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default reqwest client");
                Client::new()
            });

        Self::with_client(client)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy used by [`HttpClient::execute`]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let mut req = self.client.get(&request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    /// Map a reqwest transport error onto the bridge taxonomy
    fn classify_error(error: &reqwest::Error) -> BridgeError {
        if error.is_timeout() {
            BridgeError::Timeout(error.to_string())
        } else if error.is_connect() {
            BridgeError::ConnectionFailed(error.to_string())
        } else {
            BridgeError::OperationFailed(error.to_string())
        }
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let response = self
            .build_request(request.clone())
            .send()
            .await
            .map_err(|e| Self::classify_error(&e))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::classify_error(&e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// Retries transport failures, 5xx and 429. When attempts run out the
    /// last response (or error) is returned as-is so callers can map the
    /// status themselves.
    async fn send_with_policy(&self, request: HttpRequest, policy: RetryPolicy) -> Result<HttpResponse> {
        let attempts = policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            let outcome = self.send_once(&request).await;
            let last = attempt == attempts;

            match outcome {
                Ok(response) if last || !is_retryable_status(response.status) => {
                    return Ok(response);
                }
                Err(e) if last || !e.is_transient() => return Err(e),
                Ok(response) => {
                    warn!(url = %request.url, status = response.status, attempt, "Retryable HTTP status");
                }
                Err(e) => {
                    warn!(url = %request.url, error = %e, attempt, "HTTP transport failure");
                }
            }

            let delay = policy.delay_for_attempt(attempt);
            debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
            sleep(delay).await;
        }

        Err(BridgeError::OperationFailed(
            "Retry loop ended without an outcome".to_string(),
        ))
    }
}

fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 429
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, self.retry_policy.clone())
            .await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.send_with_policy(request, policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_client_creation() {
        let client = ReqwestHttpClient::new().with_retry_policy(RetryPolicy::no_retry());
        assert_eq!(client.retry_policy.max_attempts, 1);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(200));
    }

    #[test]
    fn test_build_request_carries_headers_and_timeout() {
        let client = ReqwestHttpClient::new();
        let request = client
            .build_request(
                HttpRequest::get("https://subs.example/search?query=matrix")
                    .header("Accept", "application/json")
                    .timeout(Duration::from_secs(3)),
            )
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/search");
        assert_eq!(request.headers()["accept"], "application/json");
        assert_eq!(request.timeout(), Some(&Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_failure() {
        let client = ReqwestHttpClient::with_timeout(Duration::from_secs(2))
            .with_retry_policy(RetryPolicy::no_retry());

        // Port 9 on loopback refuses connections on any sane test host
        let result = client
            .execute(HttpRequest::get("http://127.0.0.1:9/subtitles"))
            .await;

        match result {
            Err(err) => assert!(err.is_transient(), "unexpected error: {err}"),
            Ok(response) => panic!("expected failure, got status {}", response.status),
        }
    }
}
