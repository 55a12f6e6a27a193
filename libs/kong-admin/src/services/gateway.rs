use super::nested;
use crate::entity::{Entity, EntityService};
use crate::error::Result;
use crate::models::{FilterChain, Route, Service};
use crate::pagination::ListOpt;

impl Entity for Service {
    const COLLECTION: &'static str = "/services";
    const KIND: &'static str = "service";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

impl Entity for Route {
    const COLLECTION: &'static str = "/routes";
    const KIND: &'static str = "route";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

impl Entity for FilterChain {
    const COLLECTION: &'static str = "/filter-chains";
    const KIND: &'static str = "filter chain";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

impl EntityService<'_, Route> {
    /// Create a route attached to `service` (id or name).
    ///
    /// # Errors
    /// `BadRequest` for an invalid service identifier; API errors.
    pub async fn create_in_service(&self, service: &str, route: &Route) -> Result<Route> {
        let collection = nested("services", "service", service, "routes")?;
        self.client.create_in(&collection, route).await
    }

    /// # Errors
    /// `BadRequest` for an invalid service identifier; API errors.
    pub async fn list_for_service(
        &self,
        service: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<Route>, Option<ListOpt>)> {
        let path = nested("services", "service", service, "routes")?;
        self.client.list_page(&path, opts).await
    }
}

impl EntityService<'_, FilterChain> {
    /// # Errors
    /// `BadRequest` for an invalid service identifier; API errors.
    pub async fn list_for_service(
        &self,
        service: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<FilterChain>, Option<ListOpt>)> {
        let path = nested("services", "service", service, "filter-chains")?;
        self.client.list_page(&path, opts).await
    }

    /// # Errors
    /// `BadRequest` for an invalid route identifier; API errors.
    pub async fn list_for_route(
        &self,
        route: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<FilterChain>, Option<ListOpt>)> {
        let path = nested("routes", "route", route, "filter-chains")?;
        self.client.list_page(&path, opts).await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::Client;
    use crate::models::{Reference, Route};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn route_in_service() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/services/s1/routes")
                .json_body(json!({"paths": ["/r"]}));
            then.status(201)
                .json_body(json!({"id": "r1", "paths": ["/r"], "service": {"id": "s1"}}));
        });
        let list = server.mock(|when, then| {
            when.method(GET).path("/services/s1/routes").query_param("size", "10");
            then.status(200).json_body(json!({"data": [{"id": "r1"}], "offset": null}));
        });

        let client = Client::new(server.base_url()).unwrap();
        let route = client
            .routes()
            .create_in_service(
                "s1",
                &Route {
                    paths: Some(vec!["/r".into()]),
                    ..Route::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(route.service, Some(Reference::id("s1")));

        let (routes, next) = client
            .routes()
            .list_for_service("s1", Some(&crate::ListOpt::new().size(10)))
            .await
            .unwrap();
        assert_eq!(routes.len(), 1);
        assert!(next.is_none());
        create.assert();
        list.assert();
    }

    #[tokio::test]
    async fn filter_chains_by_parent() {
        let server = MockServer::start();
        let by_route = server.mock(|when, then| {
            when.method(GET).path("/routes/r1/filter-chains");
            then.status(200)
                .json_body(json!({"data": [{"id": "f1", "filters": [{"name": "response_transformer"}]}]}));
        });

        let client = Client::new(server.base_url()).unwrap();
        let (chains, _) = client.filter_chains().list_for_route("r1", None).await.unwrap();
        by_route.assert();
        assert_eq!(chains[0].filters.as_ref().map(Vec::len), Some(1));

        let err = client
            .filter_chains()
            .list_for_service("", None)
            .await
            .unwrap_err();
        assert!(err.is_bad_request());
    }
}
