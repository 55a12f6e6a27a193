//! Client configuration.

use crate::client::Client;
use crate::error::Result;
use kong_http::{HttpClient, TlsRootConfig};
use kong_utils::SecretString;
use std::fmt;
use std::time::Duration;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("kong-admin-rust/", env!("CARGO_PKG_VERSION"));

/// Admin API address used by a stock gateway install.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";

pub const ENV_BASE_URL: &str = "KONG_ADMIN_URL";
pub const ENV_TOKEN: &str = "KONG_ADMIN_TOKEN";
pub const ENV_WORKSPACE: &str = "KONG_WORKSPACE";
pub const ENV_DEBUG: &str = "KONG_ADMIN_DEBUG";

/// Everything needed to build a [`Client`].
///
/// `request_timeout`, `max_body_size` and `tls_roots` tune the built-in
/// transport and are ignored when `http_client` is supplied.
#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub workspace: Option<String>,
    pub auth_token: Option<SecretString>,
    /// Sent on every request unless the request sets the same header.
    pub headers: Vec<(String, String)>,
    pub http_client: Option<HttpClient>,
    pub user_agent: Option<String>,
    pub cookie_jar_disabled: bool,
    /// Log each request and response at `debug` under `kong_admin::http`.
    pub debug: bool,
    pub request_timeout: Option<Duration>,
    pub max_body_size: Option<usize>,
    pub tls_roots: TlsRootConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            workspace: None,
            auth_token: None,
            headers: Vec::new(),
            http_client: None,
            user_agent: None,
            cookie_jar_disabled: false,
            debug: false,
            request_timeout: None,
            max_body_size: None,
            tls_roots: TlsRootConfig::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("workspace", &self.workspace)
            .field("auth_token", &self.auth_token)
            .field("headers", &header_names)
            .field("http_client", &self.http_client)
            .field("user_agent", &self.user_agent)
            .field("cookie_jar_disabled", &self.cookie_jar_disabled)
            .field("debug", &self.debug)
            .field("request_timeout", &self.request_timeout)
            .field("max_body_size", &self.max_body_size)
            .field("tls_roots", &self.tls_roots)
            .finish()
    }
}

impl Config {
    /// Defaults overridden by `KONG_ADMIN_URL`, `KONG_ADMIN_TOKEN`,
    /// `KONG_WORKSPACE` and `KONG_ADMIN_DEBUG`. Empty variables are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let mut config = Self::default();
        if let Some(url) = var(ENV_BASE_URL) {
            config.base_url = url;
        }
        config.auth_token = var(ENV_TOKEN).map(SecretString::from);
        config.workspace = var(ENV_WORKSPACE);
        config.debug = var(ENV_DEBUG).is_some_and(|v| {
            matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        });
        config
    }
}

/// Fluent builder for [`Client`].
///
/// ```ignore
/// let client = Client::builder("https://kong-admin.internal:8444")
///     .workspace("team-a")
///     .auth_token(std::env::var("KONG_ADMIN_TOKEN")?)
///     .header("x-request-source", "ci")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct ClientBuilder {
    config: Config,
}

impl ClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: Config {
                base_url: base_url.into(),
                ..Config::default()
            },
        }
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.config.workspace = Some(workspace.into());
        self
    }

    pub fn auth_token(mut self, token: impl Into<SecretString>) -> Self {
        self.config.auth_token = Some(token.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.push((name.into(), value.into()));
        self
    }

    /// Use a pre-built transport instead of the default one.
    pub fn http_client(mut self, http_client: HttpClient) -> Self {
        self.config.http_client = Some(http_client);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn cookie_jar_disabled(mut self, disabled: bool) -> Self {
        self.config.cookie_jar_disabled = disabled;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = Some(size);
        self
    }

    pub fn tls_roots(mut self, roots: TlsRootConfig) -> Self {
        self.config.tls_roots = roots;
        self
    }

    /// # Errors
    /// `BadRequest` for an unusable base URL, workspace name or header, and
    /// transport errors from building the default HTTP client.
    pub fn build(self) -> Result<Client> {
        Client::from_config(self.config)
    }
}
