use crate::error::{Error, Result};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

/// A fully resolved admin API request, ready for [`Client::execute`](crate::Client::execute).
///
/// Built by [`Client::new_request`](crate::Client::new_request). Headers set here
/// after construction replace the client's constant and auth headers.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Bytes>,
}

impl Request {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute URL including workspace prefix and query string.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// JSON payload, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Set a header, replacing any value the client injected.
    ///
    /// # Errors
    /// `BadRequest` if the name or value is not a valid header.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::invalid(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid(format!("invalid value for header {name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(())
    }
}

/// A successful response with its decoded body.
///
/// `status` tells a `200` update from a `201` create, or a `204` delete.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub data: T,
}

impl<T> Response<T> {
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Check a caller-supplied identifier before it becomes a path segment.
///
/// Identifiers are concatenated verbatim, so anything empty or containing `/`
/// would address a different resource.
pub(crate) fn segment<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(Error::invalid(format!("{what} cannot be empty")));
    }
    if value.contains('/') {
        return Err(Error::invalid(format!("{what} {value:?} must not contain '/'")));
    }
    Ok(value)
}

/// `collection/id` with `id` checked by [`segment`].
pub(crate) fn item_path(collection: &str, what: &str, id: &str) -> Result<String> {
    Ok(format!("{collection}/{}", segment(what, id)?))
}
