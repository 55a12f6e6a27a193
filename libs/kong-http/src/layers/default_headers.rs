use crate::error::HttpError;
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that fills in headers the request does not already carry.
#[derive(Clone, Debug)]
pub struct DefaultHeadersLayer {
    headers: Arc<HeaderMap>,
}

impl DefaultHeadersLayer {
    /// Build the layer from a user agent and extra `(name, value)` pairs.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderName` or `HttpError::InvalidHeaderValue`
    /// if any pair is not a valid header.
    pub fn try_new(user_agent: &str, extra: &[(String, String)]) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::USER_AGENT, HeaderValue::from_str(user_agent)?);
        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            headers.append(name, HeaderValue::from_str(value)?);
        }
        Ok(Self {
            headers: Arc::new(headers),
        })
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DefaultHeadersService<S> {
    inner: S,
    headers: Arc<HeaderMap>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        for name in self.headers.keys() {
            if req.headers().contains_key(name) {
                continue;
            }
            for value in self.headers.get_all(name) {
                req.headers_mut().append(name.clone(), value.clone());
            }
        }
        self.inner.call(req)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::Full;
    use tower::ServiceExt;

    /// Echoes the request headers back as response headers.
    #[derive(Clone)]
    struct EchoHeaders;

    impl Service<Request<Full<Bytes>>> for EchoHeaders {
        type Response = Response<Full<Bytes>>;
        type Error = HttpError;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
            let mut response = Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap();
            *response.headers_mut() = req.headers().clone();
            std::future::ready(Ok(response))
        }
    }

    fn request() -> http::request::Builder {
        Request::builder().method(Method::GET).uri("http://localhost/")
    }

    #[tokio::test]
    async fn adds_missing_headers() {
        let layer =
            DefaultHeadersLayer::try_new("kong-test/1", &[("x-team".to_owned(), "edge".to_owned())])
                .unwrap();
        let service = layer.layer(EchoHeaders);

        let req = request().body(Full::new(Bytes::new())).unwrap();
        let resp = service.oneshot(req).await.unwrap();

        assert_eq!(resp.headers()[http::header::USER_AGENT], "kong-test/1");
        assert_eq!(resp.headers()["x-team"], "edge");
    }

    #[tokio::test]
    async fn request_headers_win() {
        let layer =
            DefaultHeadersLayer::try_new("kong-test/1", &[("x-team".to_owned(), "edge".to_owned())])
                .unwrap();
        let service = layer.layer(EchoHeaders);

        let req = request()
            .header(http::header::USER_AGENT, "caller/2")
            .header("x-team", "core")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = service.oneshot(req).await.unwrap();

        assert_eq!(resp.headers()[http::header::USER_AGENT], "caller/2");
        let teams: Vec<&str> = resp
            .headers()
            .get_all("x-team")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(teams, vec!["core"]);
    }

    #[test]
    fn rejects_invalid_header() {
        let err = DefaultHeadersLayer::try_new("ok", &[("bad name".to_owned(), "v".to_owned())])
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeaderName(_)));

        let err = DefaultHeadersLayer::try_new("bad\nagent", &[]).unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeaderValue(_)));
    }
}
