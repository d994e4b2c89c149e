use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

use crate::types::SubtitleSource;

/// Coarse classification used by callers deciding whether to retry or
/// report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    Source,
    Parse,
    Cache,
    Cancelled,
}

#[derive(Error, Debug)]
pub enum SubtitleError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Not found at source: {0}")]
    SourceNotFound(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to parse subtitle: {0}")]
    Parse(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("No client registered for source: {0}")]
    UnsupportedSource(SubtitleSource),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Bridge error: {0}")]
    Bridge(BridgeError),
}

impl SubtitleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::SourceNotFound(_)
            | Self::HttpStatus { .. }
            | Self::UnsupportedSource(_) => ErrorKind::Source,
            Self::Decode(_) | Self::Parse(_) => ErrorKind::Parse,
            Self::Cache(_) => ErrorKind::Cache,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Bridge(err) if err.is_transient() => ErrorKind::Network,
            Self::Bridge(_) => ErrorKind::Source,
        }
    }

    /// Network failures and timeouts may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Timeout)
    }
}

impl From<BridgeError> for SubtitleError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Timeout(msg) => Self::Timeout(msg),
            BridgeError::ConnectionFailed(msg) => Self::Network(msg),
            other => Self::Bridge(other),
        }
    }
}

impl From<LibraryError> for SubtitleError {
    fn from(err: LibraryError) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for SubtitleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SubtitleError>;
