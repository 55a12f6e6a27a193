//! Error model for admin API calls.

use bytes::Bytes;
use http::StatusCode;
use kong_http::HttpError;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Stable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Client-side input rejected before dispatch, or a `400` from the gateway.
    BadRequest,
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    RateLimited,
    /// Any `5xx`.
    Server,
    /// A non-2xx status with no more specific kind.
    Api,
    /// A 2xx body that does not parse into the expected shape.
    Decode,
    /// No HTTP response: DNS, TCP, TLS, timeout or cancellation.
    Transport,
}

impl ErrorKind {
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            429 => Self::RateLimited,
            500..=599 => Self::Server,
            _ => Self::Api,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BadRequest => "bad request",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::RateLimited => "rate limited",
            Self::Server => "server error",
            Self::Api => "api error",
            Self::Decode => "decode error",
            Self::Transport => "transport error",
        })
    }
}

/// Error returned by every client operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The call was rejected before any request was sent.
    #[error("bad request: {0}")]
    InvalidInput(String),

    /// The request or query could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// The gateway answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Api {
        status: StatusCode,
        message: String,
        /// Present when the body had no usable `message` field.
        raw_body: Option<Bytes>,
    },

    #[error("failed to decode response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        status: StatusCode,
        raw_body: Bytes,
    },

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("request cancelled")]
    Cancelled,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Build the error for a non-2xx response from its status and body.
    ///
    /// The gateway's `message` field becomes the message; without one the
    /// canonical status text is used and the body is kept as `raw_body`.
    #[must_use]
    pub fn from_response(status: StatusCode, body: Bytes) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty());
        match message {
            Some(message) => Self::Api {
                status,
                message,
                raw_body: None,
            },
            None => Self::Api {
                status,
                message: status.canonical_reason().unwrap_or("unknown status").to_owned(),
                raw_body: (!body.is_empty()).then_some(body),
            },
        }
    }

    /// A `404` produced locally, for lookups that resolve to an empty result.
    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::Api {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            raw_body: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::Encode(_) => ErrorKind::BadRequest,
            Self::Api { status, .. } => ErrorKind::from_status(*status),
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Http(err) if err.is_invalid_request() => ErrorKind::BadRequest,
            Self::Http(HttpError::BodyTooLarge { .. } | HttpError::Json(_)) => ErrorKind::Decode,
            Self::Http(_) | Self::Cancelled => ErrorKind::Transport,
        }
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Http(HttpError::HttpStatus { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// The gateway's message for API errors, otherwise the error's own text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn raw_body(&self) -> Option<&Bytes> {
        match self {
            Self::Api { raw_body, .. } => raw_body.as_ref(),
            Self::Decode { raw_body, .. } => Some(raw_body),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.kind() == ErrorKind::Forbidden
    }

    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        self.kind() == ErrorKind::BadRequest
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn status_classification() {
        let cases = [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (405, ErrorKind::Api),
            (409, ErrorKind::Conflict),
            (429, ErrorKind::RateLimited),
            (500, ErrorKind::Server),
            (503, ErrorKind::Server),
        ];
        for (code, kind) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(ErrorKind::from_status(status), kind, "status {code}");
        }
    }

    #[test]
    fn message_field_is_used() {
        let err = Error::from_response(
            StatusCode::CONFLICT,
            Bytes::from_static(br#"{"message":"UNIQUE violation detected on '{name=\"foo\"}'"}"#),
        );
        assert!(err.is_conflict());
        assert!(err.message().starts_with("UNIQUE violation"));
        assert!(err.raw_body().is_none());
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    }

    #[test]
    fn unparsable_body_keeps_raw_bytes() {
        let err = Error::from_response(StatusCode::BAD_GATEWAY, Bytes::from_static(b"<html>"));
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.message(), "Bad Gateway");
        assert_eq!(err.raw_body().map(|b| &b[..]), Some(&b"<html>"[..]));
    }

    #[test]
    fn transport_errors() {
        assert!(Error::from(HttpError::Timeout(Duration::from_secs(1))).is_transport());
        assert!(Error::Cancelled.is_transport());
        assert!(Error::Cancelled.status().is_none());
    }

    #[test]
    fn invalid_request_errors() {
        assert!(Error::invalid("consumer cannot be empty").is_bad_request());
        let scheme = HttpError::InvalidScheme {
            scheme: "ftp".to_owned(),
            reason: "unsupported".to_owned(),
        };
        assert!(Error::from(scheme).is_bad_request());
    }

    #[test]
    fn decode_errors() {
        let source = serde_json::from_slice::<u32>(b"\"x\"").unwrap_err();
        let err = Error::Decode {
            source,
            status: StatusCode::OK,
            raw_body: Bytes::from_static(b"\"x\""),
        };
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.raw_body().is_some());

        let too_large = Error::from(HttpError::BodyTooLarge {
            limit: 1,
            actual: 2,
        });
        assert_eq!(too_large.kind(), ErrorKind::Decode);
    }
}
