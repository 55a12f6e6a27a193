use std::time::Duration;
use thiserror::Error;

/// What was wrong with a URL handed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    /// The string is not a URI at all
    ParseError,
    /// No host
    MissingAuthority,
    /// No scheme
    MissingScheme,
}

/// Errors produced by the transport.
///
/// A response with a non-2xx status is not an error until
/// [`HttpResponse::error_for_status`](crate::HttpResponse::error_for_status) is called.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    #[error("failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    #[error("HTTP {status}: {body_preview}")]
    HttpStatus {
        status: http::StatusCode,
        body_preview: String,
        content_type: Option<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("query encoding failed: {0}")]
    QueryEncode(#[from] serde_urlencoded::ser::Error),

    #[error("client overloaded: request buffer is full")]
    Overloaded,

    #[error("client unavailable: request worker stopped")]
    ServiceClosed,

    #[error("invalid URL '{url}': {reason}")]
    InvalidUri {
        url: String,
        kind: InvalidUriKind,
        reason: String,
    },

    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme { scheme: String, reason: String },
}

impl HttpError {
    /// Returns `true` when no response was obtained: connect, TLS, timeout or
    /// client-capacity failures.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_)
                | Self::Transport(_)
                | Self::Tls(_)
                | Self::Overloaded
                | Self::ServiceClosed
        )
    }

    /// Returns `true` when the request could not be built from the caller's input.
    #[must_use]
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::RequestBuild(_)
                | Self::InvalidHeaderName(_)
                | Self::InvalidHeaderValue(_)
                | Self::QueryEncode(_)
                | Self::InvalidUri { .. }
                | Self::InvalidScheme { .. }
        )
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}
