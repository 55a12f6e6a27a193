use super::nested;
use crate::entity::{Entity, EntityService};
use crate::error::Result;
use crate::models::{Partial, PartialLinkedPlugin, Plugin};
use crate::pagination::ListOpt;
use crate::request::segment;
use http::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;

impl Entity for Plugin {
    const COLLECTION: &'static str = "/plugins";
    const KIND: &'static str = "plugin";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Entity for Partial {
    const COLLECTION: &'static str = "/partials";
    const KIND: &'static str = "partial";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Deserialize)]
struct EnabledPlugins {
    #[serde(default)]
    enabled_plugins: Vec<String>,
}

impl EntityService<'_, Plugin> {
    /// # Errors
    /// `BadRequest` for an invalid service identifier; API errors.
    pub async fn create_for_service(&self, service: &str, plugin: &Plugin) -> Result<Plugin> {
        let collection = nested("services", "service", service, "plugins")?;
        self.client.create_in(&collection, plugin).await
    }

    /// # Errors
    /// `BadRequest` for an invalid route identifier; API errors.
    pub async fn create_for_route(&self, route: &str, plugin: &Plugin) -> Result<Plugin> {
        let collection = nested("routes", "route", route, "plugins")?;
        self.client.create_in(&collection, plugin).await
    }

    /// # Errors
    /// `BadRequest` for an invalid consumer identifier; API errors.
    pub async fn create_for_consumer(&self, consumer: &str, plugin: &Plugin) -> Result<Plugin> {
        let collection = nested("consumers", "consumer", consumer, "plugins")?;
        self.client.create_in(&collection, plugin).await
    }

    /// # Errors
    /// `BadRequest` for an invalid service identifier; API errors.
    pub async fn list_for_service(
        &self,
        service: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<Plugin>, Option<ListOpt>)> {
        let path = nested("services", "service", service, "plugins")?;
        self.client.list_page(&path, opts).await
    }

    /// # Errors
    /// `BadRequest` for an invalid route identifier; API errors.
    pub async fn list_for_route(
        &self,
        route: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<Plugin>, Option<ListOpt>)> {
        let path = nested("routes", "route", route, "plugins")?;
        self.client.list_page(&path, opts).await
    }

    /// # Errors
    /// `BadRequest` for an invalid consumer identifier; API errors.
    pub async fn list_for_consumer(
        &self,
        consumer: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<Plugin>, Option<ListOpt>)> {
        let path = nested("consumers", "consumer", consumer, "plugins")?;
        self.client.list_page(&path, opts).await
    }

    /// Names of the plugins enabled on the gateway.
    ///
    /// # Errors
    /// API, transport and decode errors.
    pub async fn list_enabled(&self) -> Result<Vec<String>> {
        let enabled: EnabledPlugins = self.client.get_json("/plugins/enabled").await?;
        Ok(enabled.enabled_plugins)
    }

    /// Schema of plugin `name`.
    ///
    /// Gateways without `/schemas/plugins/{name}` are asked at the older
    /// `/plugins/schema/{name}`.
    ///
    /// # Errors
    /// `BadRequest` for an invalid name; API errors, including `NotFound` for
    /// an unknown plugin.
    pub async fn get_schema(&self, name: &str) -> Result<Value> {
        let name = segment("plugin name", name)?;
        match self.client.get_json(&format!("/schemas/plugins/{name}")).await {
            Err(e) if e.is_not_found() => {
                self.client.get_json(&format!("/plugins/schema/{name}")).await
            }
            other => other,
        }
    }

    /// Check `plugin` against its schema without storing it.
    ///
    /// Returns `(true, "")` when valid and `(false, message)` when the gateway
    /// rejects it.
    ///
    /// # Errors
    /// Errors other than a `400` from the gateway.
    pub async fn validate(&self, plugin: &Plugin) -> Result<(bool, String)> {
        let request =
            self.client
                .new_request(Method::POST, "/schemas/plugins/validate", None::<&()>, Some(plugin))?;
        match self.client.execute_discard(request).await {
            Ok(_) => Ok((true, String::new())),
            Err(e) if e.status() == Some(StatusCode::BAD_REQUEST) => Ok((false, e.message())),
            Err(e) => Err(e),
        }
    }
}

impl EntityService<'_, Partial> {
    /// Plugins linking partial `id`.
    ///
    /// # Errors
    /// `BadRequest` for an invalid id; API errors.
    pub async fn get_linked_plugins(
        &self,
        id: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<PartialLinkedPlugin>, Option<ListOpt>)> {
        let path = nested("partials", "partial", id, "links")?;
        self.client.list_page(&path, opts).await
    }

    /// Schema of partial type `name`.
    ///
    /// # Errors
    /// `BadRequest` for an invalid name; API errors.
    pub async fn get_schema(&self, name: &str) -> Result<Value> {
        let name = segment("partial type", name)?;
        self.client.get_json(&format!("/schemas/partials/{name}")).await
    }
}
