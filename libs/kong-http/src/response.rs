use crate::error::HttpError;
use crate::security::ERROR_BODY_PREVIEW_LIMIT;
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use serde::de::DeserializeOwned;

/// Response body after decompression, boxed so the stack type stays nameable.
pub type ResponseBody = BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// A response whose body has not been read yet.
///
/// All body readers stop at the client's `max_body_size`, counted on the
/// decompressed bytes.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

impl HttpResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Read the whole body regardless of status.
    ///
    /// # Errors
    /// `HttpError::BodyTooLarge` past the limit, `HttpError::Transport` if the
    /// connection fails mid-body.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        read_limited(self.inner.into_body(), self.max_body_size).await
    }

    /// Read the body, failing with [`HttpError::HttpStatus`] on a non-2xx status.
    ///
    /// # Errors
    /// See [`error_for_status`](Self::error_for_status) and [`bytes`](Self::bytes).
    pub async fn checked_bytes(self) -> Result<Bytes, HttpError> {
        self.error_for_status().await?.bytes().await
    }

    /// Decode a 2xx body as JSON.
    ///
    /// # Errors
    /// Status, size and transport errors as in [`checked_bytes`](Self::checked_bytes);
    /// `HttpError::Json` if the body does not decode.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let body = self.checked_bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Read a 2xx body as UTF-8, replacing invalid sequences.
    ///
    /// # Errors
    /// As [`checked_bytes`](Self::checked_bytes).
    pub async fn text(self) -> Result<String, HttpError> {
        let body = self.checked_bytes().await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Pass a 2xx response through; turn anything else into
    /// [`HttpError::HttpStatus`] carrying a preview of the body.
    ///
    /// # Errors
    /// `HttpError::HttpStatus` for non-2xx, or a transport error while reading the preview.
    pub async fn error_for_status(self) -> Result<Self, HttpError> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }
        let content_type = self
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let limit = self.max_body_size.min(ERROR_BODY_PREVIEW_LIMIT);
        let body_preview = match read_limited(self.inner.into_body(), limit).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(HttpError::BodyTooLarge { .. }) => "<body too large for preview>".to_owned(),
            Err(e) => return Err(e),
        };
        Err(HttpError::HttpStatus {
            status,
            body_preview,
            content_type,
        })
    }

    #[must_use]
    pub fn into_inner(self) -> Response<ResponseBody> {
        self.inner
    }
}

async fn read_limited(body: ResponseBody, limit: usize) -> Result<Bytes, HttpError> {
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            let total = collected.len() + chunk.len();
            if total > limit {
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: total,
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}
