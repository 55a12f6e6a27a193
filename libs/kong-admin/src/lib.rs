#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Typed async client for the Kong Gateway Admin API.
//!
//! One [`Client`] talks to one admin API, optionally scoped to one workspace.
//! Resources are reached through borrowed services such as
//! [`Client::services`] and [`Client::consumers`]; credentials through
//! [`Client::credentials`] or the typed accessors like [`Client::basic_auths`].
//!
//! ```ignore
//! use kong_admin::{Client, ListOpt, models::Service};
//!
//! let client = Client::builder("http://localhost:8001")
//!     .workspace("team-a")
//!     .auth_token("s3cret")
//!     .build()?;
//!
//! let svc = client
//!     .services()
//!     .create(&Service {
//!         name: Some("billing".into()),
//!         url: Some("http://billing.internal:8080".into()),
//!         ..Service::default()
//!     })
//!     .await?;
//!
//! let tagged = client
//!     .consumers()
//!     .list_all_with(&ListOpt::new().tags(["gold", "eu"]).match_all_tags(true))
//!     .await?;
//! ```
//!
//! Errors carry a stable [`ErrorKind`]; no request is retried.

mod client;
mod config;
pub mod credentials;
mod entity;
mod error;
pub mod ids;
mod info;
pub mod models;
mod pager;
mod pagination;
mod request;
pub mod services;
pub mod version;

pub use client::{ADMIN_TOKEN_HEADER, Client};
pub use config::{
    ClientBuilder, Config, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, ENV_BASE_URL, ENV_DEBUG,
    ENV_TOKEN, ENV_WORKSPACE,
};
pub use credentials::{CredentialKind, CredentialOptions, CredentialService, Credentials};
pub use entity::{Entity, EntityService};
pub use error::{Error, ErrorKind, Result};
pub use ids::{EntityKind, FillId};
pub use info::{Info, RuntimeConfiguration};
pub use pager::{ItemStream, PageStream};
pub use pagination::{ListOpt, Page};
pub use request::{Request, Response};
pub use version::{Range, Version, VersionError};

pub use kong_http::{HttpClient, HttpClientBuilder, HttpError, TlsRootConfig};
pub use kong_utils::SecretString;
pub use tokio_util::sync::CancellationToken;
