use crate::client::{BufferedService, map_buffer_error, try_acquire_buffer_slot};
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::{HttpResponse, ResponseBody};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response};
use http_body_util::Full;
use serde::Serialize;
use tower::Service;

/// A request being assembled.
///
/// Created by [`HttpClient::request`](crate::HttpClient::request) or one of the
/// method shortcuts. Builder errors are deferred and returned by
/// [`send`](Self::send), so calls chain without `?`.
///
/// ```ignore
/// let resp = client
///     .get("http://localhost:8001/services")
///     .query(&[("size", "100")])
///     .header("kong-admin-token", token)
///     .send()
///     .await?;
/// ```
#[must_use = "a request does nothing until `send` is awaited"]
pub struct RequestBuilder {
    service: BufferedService,
    max_body_size: usize,
    transport_security: TransportSecurity,
    method: Method,
    url: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Option<Bytes>,
    json_body: bool,
    error: Option<HttpError>,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: BufferedService,
        max_body_size: usize,
        method: Method,
        url: String,
        transport_security: TransportSecurity,
    ) -> Self {
        Self {
            service,
            max_body_size,
            transport_security,
            method,
            url,
            query: None,
            headers: HeaderMap::new(),
            body: None,
            json_body: false,
            error: None,
        }
    }

    /// Append a header. Invalid names or values fail at [`send`](Self::send).
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            (Err(e), _) => self.error = Some(e.into()),
            (_, Err(e)) => self.error = Some(e.into()),
        }
        self
    }

    /// Append already-validated headers, keeping every value of repeated names.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut last = None;
        for (name, value) in headers {
            if let Some(name) = name {
                last = Some(name);
            }
            if let Some(name) = &last {
                self.headers.append(name.clone(), value);
            }
        }
        self
    }

    /// Encode `query` with `serde_urlencoded` and append it to the URL.
    ///
    /// An empty encoding adds nothing, so `Option` fields that are `None` vanish.
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        if self.error.is_some() {
            return self;
        }
        match serde_urlencoded::to_string(query) {
            Ok(encoded) if encoded.is_empty() => {}
            Ok(encoded) => {
                self.query = Some(match self.query.take() {
                    Some(existing) => format!("{existing}&{encoded}"),
                    None => encoded,
                });
            }
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    /// Serialize `body` as JSON. Sets `Content-Type: application/json` unless the
    /// caller supplies one.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        if self.error.is_some() {
            return self;
        }
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.json_body = true;
            }
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    /// Raw body; no content type is implied.
    pub fn body_bytes(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self.json_body = false;
        self
    }

    fn full_url(&self) -> String {
        match &self.query {
            Some(query) if self.url.contains('?') => format!("{}&{query}", self.url),
            Some(query) => format!("{}?{query}", self.url),
            None => self.url.clone(),
        }
    }

    fn validate_url(&self, url: &str) -> Result<http::Uri, HttpError> {
        let invalid = |kind, reason: String| HttpError::InvalidUri {
            url: url.to_owned(),
            kind,
            reason,
        };
        let uri: http::Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| invalid(InvalidUriKind::ParseError, e.to_string()))?;

        if uri.authority().is_none() {
            return Err(invalid(
                InvalidUriKind::MissingAuthority,
                "missing host".to_owned(),
            ));
        }

        match uri.scheme_str() {
            Some("https") => Ok(uri),
            Some("http") if self.transport_security == TransportSecurity::AllowInsecureHttp => {
                Ok(uri)
            }
            Some("http") => Err(HttpError::InvalidScheme {
                scheme: "http".to_owned(),
                reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
            }),
            Some(scheme) => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// are supported".to_owned(),
            }),
            None => Err(invalid(InvalidUriKind::MissingScheme, "missing scheme".to_owned())),
        }
    }

    /// Send the request.
    ///
    /// Any status, including 4xx and 5xx, is returned as `Ok`.
    ///
    /// # Errors
    /// Deferred builder errors, URL validation errors, `HttpError::Overloaded` when
    /// the request queue is full, and transport, TLS or timeout failures.
    pub async fn send(mut self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let url = self.full_url();
        let uri = self.validate_url(&url)?;

        if self.json_body && !self.headers.contains_key(http::header::CONTENT_TYPE) {
            self.headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }

        let mut request = Request::builder()
            .method(self.method)
            .uri(uri)
            .body(Full::new(self.body.unwrap_or_default()))?;
        *request.headers_mut() = self.headers;

        try_acquire_buffer_slot(&mut self.service).await?;

        let inner: Response<ResponseBody> =
            self.service.call(request).await.map_err(map_buffer_error)?;

        Ok(HttpResponse {
            inner,
            max_body_size: self.max_body_size,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::config::HttpClientConfig;
    use crate::{HttpClient, HttpClientBuilder};
    use crate::error::HttpError;
    use httpmock::prelude::*;
    use serde::Serialize;

    fn client() -> HttpClient {
        HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .build()
            .unwrap()
    }

    #[derive(Serialize)]
    struct Paging<'a> {
        size: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        offset: Option<&'a str>,
    }

    #[tokio::test]
    async fn query_is_appended() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/services")
                .query_param("size", "2")
                .query_param("offset", "abc");
            then.status(200).body("{}");
        });

        let resp = client()
            .get(&server.url("/services"))
            .query(&Paging {
                size: 2,
                offset: Some("abc"),
            })
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        mock.assert();
    }

    #[tokio::test]
    async fn query_merges_with_existing_query_string() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/consumers")
                .query_param("custom_id", "c-1")
                .query_param("size", "1");
            then.status(200).body("{}");
        });

        client()
            .get(&server.url("/consumers?custom_id=c-1"))
            .query(&Paging {
                size: 1,
                offset: None,
            })
            .send()
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn json_sets_content_type() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/routes")
                .header("content-type", "application/json")
                .json_body(serde_json::json!({"name": "r1"}));
            then.status(201).body("{}");
        });

        let resp = client()
            .post(&server.url("/routes"))
            .json(&serde_json::json!({"name": "r1"}))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 201);
        mock.assert();
    }

    #[tokio::test]
    async fn invalid_header_is_deferred() {
        let err = client()
            .get("http://localhost:1/")
            .header("bad header", "x")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeaderName(_)));
    }

    #[tokio::test]
    async fn plain_http_rejected_when_tls_only() {
        let client = HttpClient::builder().build().unwrap();
        let err = client.get("http://localhost:1/").send().await.unwrap_err();
        assert!(matches!(err, HttpError::InvalidScheme { .. }));
    }

    #[tokio::test]
    async fn relative_url_rejected() {
        let err = client().get("/services").send().await.unwrap_err();
        assert!(matches!(err, HttpError::InvalidUri { .. }));
    }
}
