//! Limits and header classification shared by the transport and its callers.

use http::HeaderName;

/// Maximum number of body bytes kept as a preview in [`HttpError::HttpStatus`](crate::HttpError::HttpStatus).
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;

/// Headers whose values must never appear in logs.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "kong-admin-token",
];

/// Returns `true` if the header carries credentials or session state.
#[must_use]
pub fn is_sensitive_header(name: &HeaderName) -> bool {
    SENSITIVE_HEADERS.contains(&name.as_str())
}
