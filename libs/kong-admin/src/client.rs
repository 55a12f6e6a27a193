//! Transport core: URL resolution, request assembly, execution and error mapping.

use crate::config::{ClientBuilder, Config, DEFAULT_USER_AGENT};
use crate::error::{Error, Result};
use crate::request::{Request, Response};
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use kong_http::{HttpClient, HttpClientBuilder, TransportSecurity};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Header carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "kong-admin-token";

const LOG_TARGET: &str = "kong_admin::http";

/// Client for one gateway admin API, optionally bound to one workspace.
///
/// Cheap to clone; clones share the connection pool, cookie jar and settings.
/// Resource services are borrowed views such as [`Client::services`].
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
    cancel: Option<CancellationToken>,
}

struct Inner {
    http: HttpClient,
    base_url: String,
    workspace: Option<String>,
    headers: HeaderMap,
    auth: Option<HeaderValue>,
    user_agent: HeaderValue,
    debug: bool,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("workspace", &self.inner.workspace)
            .field("authenticated", &self.inner.auth.is_some())
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client with default settings for `base_url`.
    ///
    /// # Errors
    /// See [`ClientBuilder::build`].
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// # Errors
    /// See [`ClientBuilder::build`].
    pub fn from_config(config: Config) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url)?;

        let workspace = match config.workspace.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(ws) => Some(crate::request::segment("workspace", ws)?.to_owned()),
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid(format!("invalid value for header {name}: {e}")))?;
            headers.append(name, value);
        }

        let auth = match &config.auth_token {
            Some(token) if !token.is_empty() => {
                let mut value = HeaderValue::from_str(token.expose())
                    .map_err(|_| Error::invalid("admin token is not a valid header value"))?;
                value.set_sensitive(true);
                Some(value)
            }
            _ => None,
        };

        let user_agent_str = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let user_agent = HeaderValue::from_str(user_agent_str)
            .map_err(|e| Error::invalid(format!("invalid user agent: {e}")))?;

        let http = match config.http_client {
            Some(http) => http,
            None => {
                let mut builder = HttpClientBuilder::new()
                    .user_agent(user_agent_str)
                    .cookie_store(!config.cookie_jar_disabled)
                    .tls_roots(config.tls_roots);
                if base_url.starts_with("http://") {
                    builder = builder.transport(TransportSecurity::AllowInsecureHttp);
                }
                if let Some(timeout) = config.request_timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(size) = config.max_body_size {
                    builder = builder.max_body_size(size);
                }
                builder.build()?
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                workspace,
                headers,
                auth,
                user_agent,
                debug: config.debug,
            }),
            cancel: None,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    #[must_use]
    pub fn workspace(&self) -> Option<&str> {
        self.inner.workspace.as_deref()
    }

    #[must_use]
    pub fn http_client(&self) -> &HttpClient {
        &self.inner.http
    }

    /// A client whose requests are aborted once `token` is cancelled.
    ///
    /// Aborted calls fail with [`Error::Cancelled`], a transport-kind error.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: Some(token),
        }
    }

    #[must_use]
    pub fn cancellation_token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Absolute URL for an API path, with the workspace prefix applied once.
    ///
    /// # Errors
    /// `BadRequest` if `path` is empty.
    pub fn resolve_url(&self, path: &str) -> Result<String> {
        if path.is_empty() {
            return Err(Error::invalid("path cannot be empty"));
        }
        let slash = if path.starts_with('/') { "" } else { "/" };
        Ok(match &self.inner.workspace {
            Some(ws) => format!("{}/{ws}{slash}{path}", self.inner.base_url),
            None => format!("{}{slash}{path}", self.inner.base_url),
        })
    }

    /// Assemble a request.
    ///
    /// `query` is form-encoded onto the URL; `None` (or a value encoding to
    /// nothing) adds no query string. `body` is sent as JSON. `Accept:
    /// application/json` is always set; constant headers and the admin token are
    /// applied last.
    ///
    /// # Errors
    /// `BadRequest` for an empty path or a query/body that cannot be encoded.
    pub fn new_request<Q, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> Result<Request>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let mut url = self.resolve_url(path)?;

        if let Some(query) = query {
            let encoded = serde_urlencoded::to_string(query)
                .map_err(|e| Error::Encode(format!("query: {e}")))?;
            if !encoded.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&encoded);
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, self.inner.user_agent.clone());

        let body = match body {
            Some(body) => {
                let bytes =
                    serde_json::to_vec(body).map_err(|e| Error::Encode(format!("body: {e}")))?;
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(Bytes::from(bytes))
            }
            None => None,
        };

        for name in self.inner.headers.keys() {
            headers.remove(name);
            for value in self.inner.headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
        if let Some(token) = &self.inner.auth {
            headers.insert(HeaderName::from_static(ADMIN_TOKEN_HEADER), token.clone());
        }

        Ok(Request {
            method,
            url,
            headers,
            body,
        })
    }

    /// Send `request` and decode a 2xx body as `T`.
    ///
    /// # Errors
    /// The classified [`Error`] for non-2xx statuses; `Decode` when the body does
    /// not match `T`; transport errors when no response arrives.
    pub async fn execute<T: DeserializeOwned>(&self, request: Request) -> Result<Response<T>> {
        let raw = self.execute_raw(request).await?;
        let data = decode(raw.status, raw.data)?;
        Ok(Response {
            status: raw.status,
            headers: raw.headers,
            data,
        })
    }

    /// Send `request`, discarding a 2xx body.
    ///
    /// # Errors
    /// As [`execute`](Self::execute), without `Decode`.
    pub async fn execute_discard(&self, request: Request) -> Result<Response<()>> {
        let raw = self.execute_raw(request).await?;
        Ok(Response {
            status: raw.status,
            headers: raw.headers,
            data: (),
        })
    }

    /// Send `request` and return the undecoded 2xx body.
    ///
    /// # Errors
    /// As [`execute_discard`](Self::execute_discard).
    pub async fn execute_raw(&self, request: Request) -> Result<Response<Bytes>> {
        let (status, headers, body) = self.dispatch(request).await?;
        if !status.is_success() {
            return Err(Error::from_response(status, body));
        }
        Ok(Response {
            status,
            headers,
            data: body,
        })
    }

    /// The gateway's root document.
    ///
    /// # Errors
    /// Transport and API errors.
    pub async fn root(&self) -> Result<serde_json::Value> {
        self.get_json("/").await
    }

    async fn dispatch(&self, request: Request) -> Result<(StatusCode, HeaderMap, Bytes)> {
        let Some(token) = &self.cancel else {
            return self.round_trip(request).await;
        };
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::Cancelled),
            result = self.round_trip(request) => result,
        }
    }

    async fn round_trip(&self, request: Request) -> Result<(StatusCode, HeaderMap, Bytes)> {
        let Request {
            method,
            url,
            headers,
            body,
        } = request;
        let debug = self.inner.debug;
        let started = Instant::now();
        let request_headers = debug.then(|| redacted(&headers, &self.inner.headers));

        let mut builder = self.inner.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            builder = builder.body_bytes(body);
        }

        let outcome = async {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, Error>((status, headers, body))
        }
        .await;

        if debug {
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            match &outcome {
                Ok((status, response_headers, body)) => tracing::debug!(
                    target: LOG_TARGET,
                    %method,
                    %url,
                    status = status.as_u16(),
                    elapsed_ms,
                    request_headers = ?request_headers,
                    response_headers = ?redacted(response_headers, &self.inner.headers),
                    body_bytes = body.len(),
                    "admin api call"
                ),
                Err(error) => tracing::debug!(
                    target: LOG_TARGET,
                    %method,
                    %url,
                    elapsed_ms,
                    request_headers = ?request_headers,
                    %error,
                    "admin api call failed"
                ),
            }
        }

        outcome
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.new_request(Method::GET, path, None::<&()>, None::<&()>)?;
        Ok(self.execute(request).await?.data)
    }

    pub(crate) async fn get_json_with<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.new_request(Method::GET, path, Some(query), None::<&()>)?;
        Ok(self.execute(request).await?.data)
    }

    pub(crate) async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.new_request(method, path, None::<&()>, Some(body))?;
        Ok(self.execute(request).await?.data)
    }

    pub(crate) async fn delete_path(&self, path: &str) -> Result<()> {
        let request = self.new_request(Method::DELETE, path, None::<&()>, None::<&()>)?;
        self.execute_discard(request).await.map(|_| ())
    }
}

pub(crate) fn decode<T: DeserializeOwned>(status: StatusCode, body: Bytes) -> Result<T> {
    match serde_json::from_slice(&body) {
        Ok(value) => Ok(value),
        Err(source) => Err(Error::Decode {
            source,
            status,
            raw_body: body,
        }),
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::invalid("base URL cannot be empty"));
    }
    let uri: http::Uri = trimmed
        .parse()
        .map_err(|e| Error::invalid(format!("invalid base URL {trimmed:?}: {e}")))?;
    match uri.scheme_str() {
        Some("http" | "https") if uri.authority().is_some() => Ok(trimmed.to_owned()),
        _ => Err(Error::invalid(format!(
            "base URL {trimmed:?} must be an absolute http:// or https:// URL"
        ))),
    }
}

/// Header list for logs with credential-bearing values replaced.
///
/// Values of caller-configured constant headers are hidden as well; they often
/// carry gateway or proxy credentials under custom names.
fn redacted(headers: &HeaderMap, constant: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if kong_http::security::is_sensitive_header(name)
                || constant.contains_key(name)
            {
                kong_utils::REDACTED.to_owned()
            } else {
                value.to_str().unwrap_or("<binary>").to_owned()
            };
            (name.as_str().to_owned(), shown)
        })
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use tracing_test::traced_test;

    #[derive(Serialize)]
    struct Paging {
        size: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        offset: Option<String>,
    }

    fn client(base: &str) -> Client {
        Client::new(base).unwrap()
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(normalize_base_url("http://h:8001/").unwrap(), "http://h:8001");
        assert_eq!(normalize_base_url(" https://h/admin// ").unwrap(), "https://h/admin");
        assert!(normalize_base_url("").unwrap_err().is_bad_request());
        assert!(normalize_base_url("h:8001").unwrap_err().is_bad_request());
        assert!(normalize_base_url("ftp://h").unwrap_err().is_bad_request());
    }

    #[tokio::test]
    async fn resolve_applies_workspace_once() {
        let plain = client("http://h:8001/");
        assert_eq!(plain.resolve_url("/services").unwrap(), "http://h:8001/services");
        assert_eq!(plain.resolve_url("services").unwrap(), "http://h:8001/services");

        let scoped = Client::builder("http://h:8001").workspace("team-a").build().unwrap();
        assert_eq!(
            scoped.resolve_url("/services").unwrap(),
            "http://h:8001/team-a/services"
        );
        assert!(scoped.resolve_url("").unwrap_err().is_bad_request());
    }

    #[tokio::test]
    async fn empty_workspace_is_no_op() {
        let client = Client::builder("http://h:8001").workspace("").build().unwrap();
        assert!(client.workspace().is_none());
        assert_eq!(client.resolve_url("/routes").unwrap(), "http://h:8001/routes");
    }

    #[tokio::test]
    async fn workspace_with_slash_rejected() {
        let err = Client::builder("http://h:8001").workspace("a/b").build().unwrap_err();
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn request_carries_query_body_and_headers() {
        let client = Client::builder("http://h:8001")
            .auth_token("secret-token")
            .header("x-team", "edge")
            .header("accept", "application/vnd.custom+json")
            .build()
            .unwrap();

        let request = client
            .new_request(
                Method::POST,
                "/services",
                Some(&Paging {
                    size: 10,
                    offset: None,
                }),
                Some(&json!({"name": "foo"})),
            )
            .unwrap();

        assert_eq!(request.url(), "http://h:8001/services?size=10");
        assert_eq!(request.headers()["kong-admin-token"], "secret-token");
        assert!(request.headers()["kong-admin-token"].is_sensitive());
        assert_eq!(request.headers()["x-team"], "edge");
        assert_eq!(request.headers()["accept"], "application/vnd.custom+json");
        assert_eq!(request.headers()["content-type"], "application/json");
        assert_eq!(request.body().unwrap().as_ref(), br#"{"name":"foo"}"#);
    }

    #[tokio::test]
    async fn nil_query_and_body_add_nothing() {
        let client = client("http://h:8001");
        let request = client
            .new_request(Method::GET, "/routes", None::<&()>, None::<&()>)
            .unwrap();
        assert_eq!(request.url(), "http://h:8001/routes");
        assert!(request.body().is_none());
        assert!(!request.headers().contains_key("content-type"));
        assert!(!request.headers().contains_key("kong-admin-token"));
        assert_eq!(request.headers()["accept"], "application/json");
        assert_eq!(request.headers()["user-agent"], DEFAULT_USER_AGENT);
    }

    #[tokio::test]
    async fn execute_decodes_and_reports_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/consumers");
            then.status(201).json_body(json!({"id": "c1", "username": "foo"}));
        });

        let client = client(&server.base_url());
        let request = client
            .new_request(Method::POST, "/consumers", None::<&()>, Some(&json!({"username": "foo"})))
            .unwrap();
        let response = client.execute::<serde_json::Value>(request).await.unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.data["id"], "c1");
    }

    #[tokio::test]
    async fn non_success_is_classified() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/services/missing");
            then.status(404).json_body(json!({"message": "Not found"}));
        });

        let err = client(&server.base_url())
            .get_json::<serde_json::Value>("/services/missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Not found");
    }

    #[tokio::test]
    async fn bad_body_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("not json");
        });

        let err = client(&server.base_url())
            .root()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Decode);
        assert_eq!(err.raw_body().map(|b| &b[..]), Some(&b"not json"[..]));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).json_body(json!({}));
        });

        let token = CancellationToken::new();
        let client = client(&server.base_url()).with_cancellation(token.clone());
        token.cancel();

        let err = client.root().await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(err.is_transport());
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_request() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .delay(std::time::Duration::from_secs(5))
                .json_body(json!({}));
        });

        let token = CancellationToken::new();
        let client = client(&server.base_url()).with_cancellation(token.clone());
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            token.cancel();
        });

        let err = client.root().await.unwrap_err();
        assert!(err.is_transport());
        canceller.await.unwrap();
    }

    #[tokio::test]
    #[traced_test]
    async fn debug_logging_redacts_token() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .header("set-cookie", "admin_session=cookie-value")
                .json_body(json!({"version": "3.9.0"}));
        });

        let client = Client::builder(server.base_url())
            .auth_token("super-secret-token")
            .debug(true)
            .build()
            .unwrap();
        client.root().await.unwrap();

        assert!(logs_contain("admin api call"));
        assert!(logs_contain("elapsed_ms"));
        assert!(logs_contain(kong_utils::REDACTED));
        assert!(!logs_contain("super-secret-token"));
        assert!(!logs_contain("cookie-value"));
    }

    #[tokio::test]
    #[traced_test]
    async fn debug_logging_hides_constant_header_values() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/").header("x-proxy-key", "proxy-secret");
            then.status(200).json_body(json!({"version": "3.9.0"}));
        });

        let client = Client::builder(server.base_url())
            .header("x-proxy-key", "proxy-secret")
            .debug(true)
            .build()
            .unwrap();
        client.root().await.unwrap();

        mock.assert();
        assert!(logs_contain("x-proxy-key"));
        assert!(!logs_contain("proxy-secret"));
    }

    #[test]
    fn redaction_covers_sensitive_and_constant_headers() {
        let mut constant = HeaderMap::new();
        constant.insert("x-team", HeaderValue::from_static("platform"));
        let mut headers = constant.clone();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("tok"));

        let shown = redacted(&headers, &constant);
        let value = |name: &str| shown.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str());
        assert_eq!(value("accept"), Some("application/json"));
        assert_eq!(value("x-team"), Some(kong_utils::REDACTED));
        assert_eq!(value(ADMIN_TOKEN_HEADER), Some(kong_utils::REDACTED));
    }
}
