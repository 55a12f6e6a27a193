use crate::config::{HttpClientConfig, RedirectConfig, TlsRootConfig, TransportSecurity};
use crate::error::HttpError;
use crate::layers::{CookieJar, CookieJarLayer, DefaultHeadersLayer, SameOriginRedirectPolicy};
use crate::response::ResponseBody;
use crate::tls;
use bytes::Bytes;
use http::Response;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::sync::Arc;
use std::time::Duration;
use tower::buffer::Buffer;
use tower::timeout::TimeoutLayer;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;
use tower_http::follow_redirect::FollowRedirectLayer;

/// Builder for [`HttpClient`](crate::HttpClient).
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    tls_config: Option<Arc<rustls::ClientConfig>>,
}

impl HttpClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self {
            config,
            tls_config: None,
        }
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a header sent on every request that does not set it itself.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.config.transport = transport;
        self
    }

    /// Shorthand for `transport(TransportSecurity::AllowInsecureHttp)`.
    #[must_use]
    pub fn allow_insecure_http(self) -> Self {
        self.transport(TransportSecurity::AllowInsecureHttp)
    }

    #[must_use]
    pub fn tls_roots(mut self, roots: TlsRootConfig) -> Self {
        self.config.tls_roots = roots;
        self
    }

    /// Use a caller-built rustls config (custom CAs, client certificates, pinned
    /// verifiers). Takes precedence over [`tls_roots`](Self::tls_roots).
    #[must_use]
    pub fn tls_config(mut self, config: rustls::ClientConfig) -> Self {
        self.tls_config = Some(Arc::new(config));
        self
    }

    #[must_use]
    pub fn redirect(mut self, redirect: RedirectConfig) -> Self {
        self.config.redirect = redirect;
        self
    }

    /// Keep and replay session cookies. On by default.
    #[must_use]
    pub fn cookie_store(mut self, enabled: bool) -> Self {
        self.config.cookie_store = enabled;
        self
    }

    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Build the client.
    ///
    /// Must be called inside a Tokio runtime: the request buffer spawns its worker
    /// task here.
    ///
    /// # Errors
    /// `HttpError::Tls` if the trust store cannot be set up, header errors for an
    /// invalid user agent or default header.
    pub fn build(self) -> Result<crate::HttpClient, HttpError> {
        if self.config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!("plain HTTP allowed (TransportSecurity::AllowInsecureHttp)");
        }

        let timeout = self.config.request_timeout;
        let https = build_https_connector(
            self.tls_config,
            self.config.tls_roots,
            self.config.transport,
        )?;

        let mut client_builder = Client::builder(TokioExecutor::new());
        client_builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(self.config.pool_max_idle_per_host)
            .http2_only(false);
        if let Some(idle_timeout) = self.config.pool_idle_timeout {
            client_builder.pool_idle_timeout(idle_timeout);
        }
        let hyper_client = client_builder.build::<_, Full<Bytes>>(https);

        let headers_layer =
            DefaultHeadersLayer::try_new(&self.config.user_agent, &self.config.default_headers)?;

        // Outer to inner:
        //   Buffer -> CookieJar? -> ErrorMapping -> Timeout -> DefaultHeaders ->
        //   Decompression -> FollowRedirect -> hyper
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .layer(headers_layer)
            .layer(DecompressionLayer::new())
            .layer(FollowRedirectLayer::with_policy(SameOriginRedirectPolicy::new(
                self.config.redirect.clone(),
            )))
            .service(hyper_client)
            .map_response(map_decompression_response)
            .map_err(move |e: tower::BoxError| map_tower_error(e, timeout));

        let mut boxed_service = service.boxed_clone();

        let cookies = if self.config.cookie_store {
            let jar = CookieJar::new();
            boxed_service = ServiceBuilder::new()
                .layer(CookieJarLayer::new(jar.clone()))
                .service(boxed_service)
                .boxed_clone();
            Some(jar)
        } else {
            None
        };

        let buffered_service: crate::client::BufferedService =
            Buffer::new(boxed_service, self.config.buffer_capacity.max(1));

        Ok(crate::HttpClient {
            service: buffered_service,
            max_body_size: self.config.max_body_size,
            transport_security: self.config.transport,
            cookies,
        })
    }
}

fn map_tower_error(err: tower::BoxError, timeout: Duration) -> HttpError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpError::Timeout(timeout);
    }
    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(other) => HttpError::Transport(other),
    }
}

fn map_decompression_response<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = response.into_parts();
    let boxed_body: ResponseBody = body.map_err(Into::into).boxed();
    Response::from_parts(parts, boxed_body)
}

fn build_https_connector(
    custom: Option<Arc<rustls::ClientConfig>>,
    tls_roots: TlsRootConfig,
    transport: TransportSecurity,
) -> Result<HttpsConnector<HttpConnector>, HttpError> {
    let builder = match (custom, tls_roots) {
        (Some(config), _) => {
            hyper_rustls::HttpsConnectorBuilder::new().with_tls_config((*config).clone())
        }
        (None, TlsRootConfig::WebPki) => hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(tls::crypto_provider())
            .map_err(|e| HttpError::Tls(Box::new(e)))?,
        (None, TlsRootConfig::Native) => {
            let config = tls::native_roots_client_config().map_err(|e| HttpError::Tls(e.into()))?;
            hyper_rustls::HttpsConnectorBuilder::new().with_tls_config(config)
        }
    };

    let connector = if transport == TransportSecurity::AllowInsecureHttp {
        builder.https_or_http().enable_all_versions().build()
    } else {
        builder.https_only().enable_all_versions().build()
    };
    Ok(connector)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;

    #[test]
    fn builder_defaults() {
        let builder = HttpClientBuilder::new();
        assert_eq!(builder.config.request_timeout, Duration::from_secs(30));
        assert_eq!(builder.config.user_agent, DEFAULT_USER_AGENT);
        assert!(builder.config.cookie_store);
        assert!(builder.tls_config.is_none());
    }

    #[test]
    fn setters_update_config() {
        let builder = HttpClientBuilder::new()
            .timeout(Duration::from_secs(5))
            .user_agent("kong-admin-rust/test")
            .default_header("x-env", "staging")
            .max_body_size(1024)
            .allow_insecure_http()
            .cookie_store(false)
            .redirect(RedirectConfig::disabled());

        assert_eq!(builder.config.request_timeout, Duration::from_secs(5));
        assert_eq!(builder.config.user_agent, "kong-admin-rust/test");
        assert_eq!(
            builder.config.default_headers,
            vec![("x-env".to_owned(), "staging".to_owned())]
        );
        assert_eq!(builder.config.max_body_size, 1024);
        assert_eq!(builder.config.transport, TransportSecurity::AllowInsecureHttp);
        assert!(!builder.config.cookie_store);
        assert_eq!(builder.config.redirect.max_redirects, 0);
    }

    #[tokio::test]
    async fn invalid_user_agent_fails_build() {
        let err = HttpClientBuilder::new()
            .user_agent("bad\r\nagent")
            .build()
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeaderValue(_)));
    }

    #[tokio::test]
    async fn custom_tls_config_is_accepted() {
        let config = rustls::ClientConfig::builder_with_provider(tls::crypto_provider())
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_root_certificates(rustls::RootCertStore::empty())
            .with_no_client_auth();
        let client = HttpClientBuilder::new().tls_config(config).build();
        assert!(client.is_ok());
    }

    #[test]
    fn timeout_error_maps_to_timeout() {
        let elapsed: tower::BoxError = Box::new(tower::timeout::error::Elapsed::new());
        let err = map_tower_error(elapsed, Duration::from_secs(3));
        assert!(matches!(err, HttpError::Timeout(d) if d == Duration::from_secs(3)));
    }
}
