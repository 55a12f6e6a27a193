//! Deterministic entity identifiers.
//!
//! Each entity kind has its own UUIDv5 namespace derived from [`ENTITY_ROOT`]
//! and its plural collection name. An id is the v5 UUID of the entity's
//! natural key in that namespace, prefixed by `workspace/` when a workspace is
//! given, so the same key always yields the same id and the same key under two
//! kinds never collides.

use crate::error::{Error, Result};
use crate::models::{Consumer, ConsumerGroup, Plugin, Reference, Route, Service, Vault};
use std::sync::LazyLock;
use uuid::Uuid;

/// Root namespace for entity ids.
pub const ENTITY_ROOT: Uuid = uuid::uuid!("fd02801f-0957-4a15-a9bb-b4f4e11d1de1");

/// Kinds that support deterministic ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Service,
    Route,
    Consumer,
    ConsumerGroup,
    Vault,
    Plugin,
}

impl EntityKind {
    pub const ALL: [Self; 6] = [
        Self::Service,
        Self::Route,
        Self::Consumer,
        Self::ConsumerGroup,
        Self::Vault,
        Self::Plugin,
    ];

    /// Plural collection name the namespace is derived from.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Service => "services",
            Self::Route => "routes",
            Self::Consumer => "consumers",
            Self::ConsumerGroup => "consumer-groups",
            Self::Vault => "vaults",
            Self::Plugin => "plugins",
        }
    }

    /// `UUIDv5(ENTITY_ROOT, plural)`.
    #[must_use]
    pub fn namespace(self) -> Uuid {
        static NAMESPACES: LazyLock<[Uuid; 6]> = LazyLock::new(|| {
            EntityKind::ALL.map(|kind| Uuid::new_v5(&ENTITY_ROOT, kind.plural().as_bytes()))
        });
        NAMESPACES[self as usize]
    }

    /// Id for `key`, scoped to `workspace` when one is given.
    ///
    /// # Errors
    /// `BadRequest` if `key` is empty.
    pub fn id_for(self, workspace: Option<&str>, key: &str) -> Result<Uuid> {
        if key.is_empty() {
            return Err(Error::invalid(format!(
                "cannot derive a {} id without a natural key",
                self.plural()
            )));
        }
        let material = match kong_utils::values::non_empty(workspace) {
            Some(ws) => format!("{ws}/{key}"),
            None => key.to_owned(),
        };
        Ok(Uuid::new_v5(&self.namespace(), material.as_bytes()))
    }
}

/// Entities that can compute their own id before creation.
pub trait FillId {
    /// Set `id` from the natural key unless an id is already present.
    ///
    /// # Errors
    /// `BadRequest` if there is no id and no natural key.
    fn fill_id(&mut self, workspace: Option<&str>) -> Result<()>;
}

fn fill(
    id: &mut Option<String>,
    kind: EntityKind,
    workspace: Option<&str>,
    key: Option<&str>,
) -> Result<()> {
    if kong_utils::values::non_empty(id.as_deref()).is_some() {
        return Ok(());
    }
    let key = key.ok_or_else(|| {
        Error::invalid(format!("cannot derive a {} id without a natural key", kind.plural()))
    })?;
    *id = Some(kind.id_for(workspace, key)?.to_string());
    Ok(())
}

impl FillId for Service {
    fn fill_id(&mut self, workspace: Option<&str>) -> Result<()> {
        fill(&mut self.id, EntityKind::Service, workspace, self.name.as_deref())
    }
}

impl FillId for Route {
    fn fill_id(&mut self, workspace: Option<&str>) -> Result<()> {
        fill(&mut self.id, EntityKind::Route, workspace, self.name.as_deref())
    }
}

impl FillId for Consumer {
    fn fill_id(&mut self, workspace: Option<&str>) -> Result<()> {
        fill(&mut self.id, EntityKind::Consumer, workspace, self.username.as_deref())
    }
}

impl FillId for ConsumerGroup {
    fn fill_id(&mut self, workspace: Option<&str>) -> Result<()> {
        fill(&mut self.id, EntityKind::ConsumerGroup, workspace, self.name.as_deref())
    }
}

impl FillId for Vault {
    fn fill_id(&mut self, workspace: Option<&str>) -> Result<()> {
        fill(&mut self.id, EntityKind::Vault, workspace, self.prefix.as_deref())
    }
}

impl FillId for Plugin {
    fn fill_id(&mut self, workspace: Option<&str>) -> Result<()> {
        let key = plugin_key(self);
        fill(&mut self.id, EntityKind::Plugin, workspace, key.as_deref())
    }
}

/// `name[:service/x][:route/x][:consumer/x][:consumer_group/x]`.
fn plugin_key(plugin: &Plugin) -> Option<String> {
    let mut key = kong_utils::values::non_empty(plugin.name.as_deref())?.to_owned();
    let scopes: [(&str, Option<&Reference>); 4] = [
        ("service", plugin.service.as_ref()),
        ("route", plugin.route.as_ref()),
        ("consumer", plugin.consumer.as_ref()),
        ("consumer_group", plugin.consumer_group.as_ref()),
    ];
    for (scope, reference) in scopes {
        if let Some(target) = reference.and_then(Reference::name_or_id) {
            key.push(':');
            key.push_str(scope);
            key.push('/');
            key.push_str(target);
        }
    }
    Some(key)
}
