use std::time::Duration;

/// User agent sent when the caller does not configure one.
pub const DEFAULT_USER_AGENT: &str = concat!("kong-http/", env!("CARGO_PKG_VERSION"));

/// Source of trusted root certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsRootConfig {
    /// Mozilla roots compiled into the binary
    #[default]
    WebPki,
    /// Roots from the OS certificate store, loaded once per process
    Native,
}

/// Which URL schemes the client accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportSecurity {
    /// Only `https://`
    #[default]
    TlsOnly,
    /// `http://` and `https://`. Kong admin listeners commonly run plain HTTP on a
    /// private interface.
    AllowInsecureHttp,
}

/// Redirect handling.
///
/// Only same-origin redirects are followed. Cross-origin targets end the chain and
/// the 3xx response is returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectConfig {
    /// `0` disables redirect following
    pub max_redirects: usize,
    /// Follow `https` -> `http` on the same host
    pub allow_https_downgrade: bool,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            max_redirects: 10,
            allow_https_downgrade: false,
        }
    }
}

impl RedirectConfig {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_redirects: 0,
            allow_https_downgrade: false,
        }
    }
}

/// Settings for [`HttpClientBuilder`](crate::HttpClientBuilder).
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Timeout for one request, including redirects and body headers
    pub request_timeout: Duration,

    /// Limit on the decompressed response body
    pub max_body_size: usize,

    pub user_agent: String,

    /// Extra headers added to every request that does not already carry them
    pub default_headers: Vec<(String, String)>,

    pub transport: TransportSecurity,

    pub tls_roots: TlsRootConfig,

    /// Requests queued for the worker before `send` fails with
    /// [`HttpError::Overloaded`](crate::HttpError::Overloaded)
    pub buffer_capacity: usize,

    pub redirect: RedirectConfig,

    /// Keep `Set-Cookie` values and replay them on later requests
    pub cookie_store: bool,

    /// `None` keeps idle connections forever
    pub pool_idle_timeout: Option<Duration>,

    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            default_headers: Vec::new(),
            transport: TransportSecurity::TlsOnly,
            tls_roots: TlsRootConfig::WebPki,
            buffer_capacity: 1024,
            redirect: RedirectConfig::default(),
            cookie_store: true,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }
}

impl HttpClientConfig {
    /// Settings for talking to a local mock server.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_body_size: 1024 * 1024,
            transport: TransportSecurity::AllowInsecureHttp,
            buffer_capacity: 256,
            pool_idle_timeout: Some(Duration::from_secs(10)),
            pool_max_idle_per_host: 4,
            ..Self::default()
        }
    }
}
