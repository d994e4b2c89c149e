//! Canned-response HTTP client for provider tests.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::sync::Mutex;

enum Reply {
    Response(u16, String),
    Failure(BridgeError),
}

/// Answers by exact URL; unknown URLs get a 404. Every request is recorded.
#[derive(Default)]
pub(crate) struct StubHttpClient {
    replies: HashMap<String, Reply>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubHttpClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, url: &str, status: u16, body: &str) -> Self {
        self.replies
            .insert(url.to_string(), Reply::Response(status, body.to_string()));
        self
    }

    pub(crate) fn fail(mut self, url: &str, error: BridgeError) -> Self {
        self.replies.insert(url.to_string(), Reply::Failure(error));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for StubHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        match self.replies.get(&url) {
            Some(Reply::Response(status, body)) => Ok(HttpResponse::new(*status, body.clone())),
            Some(Reply::Failure(error)) => Err(clone_error(error)),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}

fn clone_error(error: &BridgeError) -> BridgeError {
    match error {
        BridgeError::Timeout(msg) => BridgeError::Timeout(msg.clone()),
        BridgeError::ConnectionFailed(msg) => BridgeError::ConnectionFailed(msg.clone()),
        other => BridgeError::OperationFailed(other.to_string()),
    }
}
