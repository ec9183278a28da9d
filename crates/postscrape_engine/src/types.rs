use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

/// Browser cookies as name/value pairs, replayed on probe requests.
pub type Cookies = BTreeMap<String, String>;

/// Header map sent with probe requests. Keys are lower-case.
pub type RequestHeaders = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEventKind {
    Request,
    Response,
}

/// One entry of the browser's captured network traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEvent {
    pub kind: NetworkEventKind,
    pub url: String,
    /// Headers of the originating request; only present on request events.
    pub headers: Option<BTreeMap<String, String>>,
}

impl NetworkEvent {
    pub fn request(url: impl Into<String>, headers: BTreeMap<String, String>) -> Self {
        Self {
            kind: NetworkEventKind::Request,
            url: url.into(),
            headers: Some(headers),
        }
    }

    pub fn response(url: impl Into<String>) -> Self {
        Self {
            kind: NetworkEventKind::Response,
            url: url.into(),
            headers: None,
        }
    }
}

/// What a probe request learned about a resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    /// Total size from `Content-Range`, when the server sent one.
    pub total_length: Option<u64>,
    /// Bytes actually read from the body (capped at the requested range).
    pub body_len: u64,
}

impl ProbeResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 206)
    }

    /// Largest size the server declared for the resource.
    pub fn declared_length(&self) -> Option<u64> {
        match (self.total_length, self.content_length) {
            (Some(total), Some(len)) => Some(total.max(len)),
            (total, len) => total.or(len),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("browser protocol error: {0}")]
    Protocol(String),
    #[error("browser session is closed")]
    Closed,
    #[error("browser operation timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("probe timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
}

/// Failures that end a video resolution early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("could not load page: {0}")]
    Navigation(#[source] BrowserError),
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}
