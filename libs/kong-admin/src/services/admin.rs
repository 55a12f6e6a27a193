use super::nested;
use crate::client::Client;
use crate::entity::{Entity, EntityService};
use crate::error::{Error, Result};
use crate::models::{
    Developer, DeveloperRole, RbacEndpointPermission, RbacEntityPermission, RbacRole, Workspace,
};
use crate::pagination::ListOpt;
use crate::request::{item_path, segment};
use http::Method;

impl Entity for Workspace {
    const COLLECTION: &'static str = "/workspaces";
    const KIND: &'static str = "workspace";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

impl Entity for RbacRole {
    const COLLECTION: &'static str = "/rbac/roles";
    const KIND: &'static str = "RBAC role";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

impl Entity for Developer {
    const COLLECTION: &'static str = "/developers";
    const KIND: &'static str = "developer";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.email.as_deref())
    }
}

impl Entity for DeveloperRole {
    const COLLECTION: &'static str = "/developers/roles";
    const KIND: &'static str = "developer role";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

impl EntityService<'_, Workspace> {
    /// Whether workspace `name` (or id) exists.
    ///
    /// # Errors
    /// `BadRequest` for an invalid name; API errors other than `NotFound`.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        match self.get(name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn role_collection(role: &str, child: &str) -> Result<String> {
    nested("rbac/roles", "RBAC role", role, child)
}

/// `/rbac/roles/{role}/endpoints/{workspace}/{endpoint}`.
///
/// The endpoint is itself an admin API path, so it keeps its inner slashes;
/// only the leading one is dropped.
fn endpoint_path(role: &str, workspace: &str, endpoint: &str) -> Result<String> {
    let collection = role_collection(role, "endpoints")?;
    let workspace = segment("workspace", workspace)?;
    let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
    if endpoint.is_empty() {
        return Err(Error::invalid("endpoint cannot be empty"));
    }
    Ok(format!("{collection}/{workspace}/{endpoint}"))
}

/// Endpoint permissions of RBAC roles.
#[derive(Debug, Clone, Copy)]
pub struct RbacEndpointPermissions<'a> {
    client: &'a Client,
}

impl<'a> RbacEndpointPermissions<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// # Errors
    /// `BadRequest` for an invalid role; API errors.
    pub async fn create(
        &self,
        role: &str,
        permission: &RbacEndpointPermission,
    ) -> Result<RbacEndpointPermission> {
        let path = role_collection(role, "endpoints")?;
        self.client.send_json(Method::POST, &path, permission).await
    }

    /// # Errors
    /// `BadRequest` for invalid identifiers; API errors.
    pub async fn get(
        &self,
        role: &str,
        workspace: &str,
        endpoint: &str,
    ) -> Result<RbacEndpointPermission> {
        self.client
            .get_json(&endpoint_path(role, workspace, endpoint)?)
            .await
    }

    /// Update the permission addressed by its `workspace` and `endpoint`.
    ///
    /// # Errors
    /// `BadRequest` when either is missing; API errors.
    pub async fn update(
        &self,
        role: &str,
        permission: &RbacEndpointPermission,
    ) -> Result<RbacEndpointPermission> {
        let (Some(workspace), Some(endpoint)) =
            (permission.workspace.as_deref(), permission.endpoint.as_deref())
        else {
            return Err(Error::invalid(
                "workspace and endpoint are required to update an endpoint permission",
            ));
        };
        let path = endpoint_path(role, workspace, endpoint)?;
        self.client.send_json(Method::PATCH, &path, permission).await
    }

    /// # Errors
    /// `BadRequest` for invalid identifiers; API errors.
    pub async fn delete(&self, role: &str, workspace: &str, endpoint: &str) -> Result<()> {
        self.client
            .delete_path(&endpoint_path(role, workspace, endpoint)?)
            .await
    }

    /// # Errors
    /// `BadRequest` for an invalid role; API errors.
    pub async fn list(
        &self,
        role: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<RbacEndpointPermission>, Option<ListOpt>)> {
        self.client
            .list_page(&role_collection(role, "endpoints")?, opts)
            .await
    }

    /// # Errors
    /// `BadRequest` for an invalid role; API errors.
    pub async fn list_all(&self, role: &str) -> Result<Vec<RbacEndpointPermission>> {
        self.client
            .collect_all(&role_collection(role, "endpoints")?, None, false)
            .await
    }
}

/// Entity permissions of RBAC roles.
#[derive(Debug, Clone, Copy)]
pub struct RbacEntityPermissions<'a> {
    client: &'a Client,
}

impl<'a> RbacEntityPermissions<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// # Errors
    /// `BadRequest` for an invalid role; API errors.
    pub async fn create(
        &self,
        role: &str,
        permission: &RbacEntityPermission,
    ) -> Result<RbacEntityPermission> {
        let path = role_collection(role, "entities")?;
        self.client.send_json(Method::POST, &path, permission).await
    }

    /// # Errors
    /// `BadRequest` for invalid identifiers; API errors.
    pub async fn get(&self, role: &str, entity_id: &str) -> Result<RbacEntityPermission> {
        let path = item_path(&role_collection(role, "entities")?, "entity id", entity_id)?;
        self.client.get_json(&path).await
    }

    /// Update the permission addressed by its `entity_id`.
    ///
    /// # Errors
    /// `BadRequest` when `entity_id` is missing; API errors.
    pub async fn update(
        &self,
        role: &str,
        permission: &RbacEntityPermission,
    ) -> Result<RbacEntityPermission> {
        let entity_id = permission.entity_id.as_deref().ok_or_else(|| {
            Error::invalid("entity_id is required to update an entity permission")
        })?;
        let path = item_path(&role_collection(role, "entities")?, "entity id", entity_id)?;
        self.client.send_json(Method::PATCH, &path, permission).await
    }

    /// # Errors
    /// `BadRequest` for invalid identifiers; API errors.
    pub async fn delete(&self, role: &str, entity_id: &str) -> Result<()> {
        let path = item_path(&role_collection(role, "entities")?, "entity id", entity_id)?;
        self.client.delete_path(&path).await
    }

    /// # Errors
    /// `BadRequest` for an invalid role; API errors.
    pub async fn list(
        &self,
        role: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<RbacEntityPermission>, Option<ListOpt>)> {
        self.client
            .list_page(&role_collection(role, "entities")?, opts)
            .await
    }

    /// # Errors
    /// `BadRequest` for an invalid role; API errors.
    pub async fn list_all(&self, role: &str) -> Result<Vec<RbacEntityPermission>> {
        self.client
            .collect_all(&role_collection(role, "entities")?, None, false)
            .await
    }
}
