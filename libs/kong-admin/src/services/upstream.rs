use super::nested;
use crate::client::Client;
use crate::entity::{Entity, EntityService};
use crate::error::Result;
use crate::models::{Target, TargetHealth, Upstream};
use crate::pagination::ListOpt;
use crate::request::item_path;
use http::Method;

impl Entity for Upstream {
    const COLLECTION: &'static str = "/upstreams";
    const KIND: &'static str = "upstream";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

/// Targets only exist under an upstream; see [`Targets`].
impl Entity for Target {
    const COLLECTION: &'static str = "/targets";
    const KIND: &'static str = "target";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.target.as_deref())
    }
}

fn targets_of(upstream: &str) -> Result<String> {
    nested("upstreams", "upstream", upstream, "targets")
}

impl EntityService<'_, Upstream> {
    /// Health of every target of `upstream`, as seen by this node.
    ///
    /// # Errors
    /// `BadRequest` for an invalid upstream identifier; API errors.
    pub async fn health(&self, upstream: &str) -> Result<Vec<TargetHealth>> {
        let path = nested("upstreams", "upstream", upstream, "health")?;
        self.client.collect_all(&path, None, false).await
    }
}

/// Targets of an upstream.
#[derive(Debug, Clone, Copy)]
pub struct Targets<'a> {
    client: &'a Client,
}

impl<'a> Targets<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// # Errors
    /// `BadRequest` for an invalid upstream identifier; API errors.
    pub async fn create(&self, upstream: &str, target: &Target) -> Result<Target> {
        self.client.create_in(&targets_of(upstream)?, target).await
    }

    /// Fetch by id or `host:port`.
    ///
    /// # Errors
    /// `BadRequest` for invalid identifiers; API errors.
    pub async fn get(&self, upstream: &str, target: &str) -> Result<Target> {
        self.client
            .get_in(&targets_of(upstream)?, Target::KIND, target)
            .await
    }

    /// # Errors
    /// `BadRequest` when `target` has neither id nor address; API errors.
    pub async fn update(&self, upstream: &str, target: &Target) -> Result<Target> {
        self.client.update_in(&targets_of(upstream)?, target).await
    }

    /// # Errors
    /// `BadRequest` for invalid identifiers; API errors.
    pub async fn delete(&self, upstream: &str, target: &str) -> Result<()> {
        self.client
            .delete_in(&targets_of(upstream)?, Target::KIND, target)
            .await
    }

    /// # Errors
    /// `BadRequest` for an invalid upstream identifier; API errors.
    pub async fn list(
        &self,
        upstream: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<Target>, Option<ListOpt>)> {
        self.client.list_page(&targets_of(upstream)?, opts).await
    }

    /// # Errors
    /// `BadRequest` for an invalid upstream identifier; API errors.
    pub async fn list_all(&self, upstream: &str) -> Result<Vec<Target>> {
        self.client
            .collect_all(&targets_of(upstream)?, None, false)
            .await
    }

    /// Override health checks and mark `target` healthy.
    ///
    /// # Errors
    /// `BadRequest` for invalid identifiers; API errors.
    pub async fn mark_healthy(&self, upstream: &str, target: &str) -> Result<()> {
        self.set_health(upstream, target, "healthy").await
    }

    /// Override health checks and mark `target` unhealthy.
    ///
    /// # Errors
    /// `BadRequest` for invalid identifiers; API errors.
    pub async fn mark_unhealthy(&self, upstream: &str, target: &str) -> Result<()> {
        self.set_health(upstream, target, "unhealthy").await
    }

    async fn set_health(&self, upstream: &str, target: &str, state: &str) -> Result<()> {
        let target_path = item_path(&targets_of(upstream)?, Target::KIND, target)?;
        let path = format!("{target_path}/{state}");
        let request = self
            .client
            .new_request(Method::PUT, &path, None::<&()>, None::<&()>)?;
        self.client.execute_discard(request).await.map(|_| ())
    }
}
