//! Per-resource services.
//!
//! Each accessor on [`Client`] returns a borrowed view. Plain collections share
//! [`EntityService`]; resource-specific operations are inherent methods on the
//! concrete `EntityService<'_, T>`, and nested collections have their own
//! service types.

mod admin;
mod certificate;
mod consumer;
mod gateway;
mod plugin;
mod security;
mod upstream;

pub use admin::{RbacEndpointPermissions, RbacEntityPermissions};
pub use upstream::Targets;

use crate::client::Client;
use crate::entity::EntityService;
use crate::error::Result;
use crate::models::{
    CaCertificate, Certificate, Consumer, ConsumerGroup, Developer, DeveloperRole, FilterChain,
    Key, KeySet, License, Partial, Plugin, RbacRole, Route, Service, Sni, Upstream, Vault,
    Workspace,
};
use crate::request::segment;

impl Client {
    #[must_use]
    pub fn services(&self) -> EntityService<'_, Service> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn routes(&self) -> EntityService<'_, Route> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn consumers(&self) -> EntityService<'_, Consumer> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn consumer_groups(&self) -> EntityService<'_, ConsumerGroup> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn upstreams(&self) -> EntityService<'_, Upstream> {
        EntityService::new(self)
    }

    /// Targets, scoped by upstream on every call.
    #[must_use]
    pub fn targets(&self) -> Targets<'_> {
        Targets::new(self)
    }

    #[must_use]
    pub fn certificates(&self) -> EntityService<'_, Certificate> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn ca_certificates(&self) -> EntityService<'_, CaCertificate> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn snis(&self) -> EntityService<'_, Sni> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn plugins(&self) -> EntityService<'_, Plugin> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn partials(&self) -> EntityService<'_, Partial> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn filter_chains(&self) -> EntityService<'_, FilterChain> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn vaults(&self) -> EntityService<'_, Vault> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn keys(&self) -> EntityService<'_, Key> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn key_sets(&self) -> EntityService<'_, KeySet> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn licenses(&self) -> EntityService<'_, License> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn workspaces(&self) -> EntityService<'_, Workspace> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn rbac_roles(&self) -> EntityService<'_, RbacRole> {
        EntityService::new(self)
    }

    /// Endpoint permissions, scoped by role on every call.
    #[must_use]
    pub fn rbac_endpoint_permissions(&self) -> RbacEndpointPermissions<'_> {
        RbacEndpointPermissions::new(self)
    }

    /// Entity permissions, scoped by role on every call.
    #[must_use]
    pub fn rbac_entity_permissions(&self) -> RbacEntityPermissions<'_> {
        RbacEntityPermissions::new(self)
    }

    #[must_use]
    pub fn developers(&self) -> EntityService<'_, Developer> {
        EntityService::new(self)
    }

    #[must_use]
    pub fn developer_roles(&self) -> EntityService<'_, DeveloperRole> {
        EntityService::new(self)
    }
}

/// `/{parent}/{key}/{child}` with `key` checked as a path segment.
fn nested(parent: &str, what: &str, key: &str, child: &str) -> Result<String> {
    Ok(format!("/{parent}/{}/{child}", segment(what, key)?))
}
