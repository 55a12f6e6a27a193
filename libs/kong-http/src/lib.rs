#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for the Kong admin client
//!
//! A hyper client behind a small tower stack:
//! - rustls TLS with webpki or native roots, or a caller-provided `ClientConfig`
//! - connection pooling over HTTP/1.1 and HTTP/2
//! - per-request timeout
//! - default headers (`User-Agent` and anything configured on the builder)
//! - an in-memory cookie jar, on by default
//! - same-origin redirect following
//! - transparent gzip/brotli/deflate decompression with a decompressed-size limit
//!
//! Requests are never retried. A non-2xx status is a normal response; use
//! [`HttpResponse::error_for_status`] to turn it into an error.
//!
//! # Example
//!
//! ```ignore
//! use kong_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .user_agent("my-tool/1.0")
//!     .build()?;
//!
//! let status: serde_json::Value = client
//!     .get("https://kong-admin.internal:8444/status")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod layers;
mod request;
mod response;
pub mod security;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{
    DEFAULT_USER_AGENT, HttpClientConfig, RedirectConfig, TlsRootConfig, TransportSecurity,
};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{
    CookieJar, CookieJarLayer, CookieJarService, DefaultHeadersLayer, DefaultHeadersService,
    SameOriginRedirectPolicy,
};
pub use request::RequestBuilder;
pub use response::{HttpResponse, ResponseBody};
