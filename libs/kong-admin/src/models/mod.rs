//! Wire records for gateway entities.
//!
//! Every field is optional so partial updates and partial responses
//! round-trip; absent fields are omitted on the wire rather than sent as zero
//! values. Free-form `config` trees are kept as [`Configuration`] maps.

mod admin;
mod certificate;
mod consumer;
mod credential;
mod plugin;
mod reference;
mod security;
mod service;
mod upstream;

pub use admin::{Developer, DeveloperRole, RbacEndpointPermission, RbacEntityPermission, RbacRole, Workspace};
pub use certificate::{CaCertificate, Certificate, Sni};
pub use consumer::{Consumer, ConsumerGroup, ConsumerGroupMembers};
pub use credential::{Acl, BasicAuth, HmacAuth, JwtAuth, KeyAuth, MtlsAuth, Oauth2Credential};
pub use kong_utils::Configuration;
pub use plugin::{Filter, FilterChain, Partial, PartialLink, PartialLinkedPlugin, Plugin};
pub use reference::Reference;
pub use security::{Key, KeySet, License, PemKey, Vault};
pub use service::{CidrPort, Route, Service};
pub use upstream::{Target, TargetHealth, Upstream};
