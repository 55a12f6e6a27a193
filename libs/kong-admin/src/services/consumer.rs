use super::nested;
use crate::entity::{Entity, EntityService};
use crate::error::{Error, Result};
use crate::models::{Consumer, ConsumerGroup, ConsumerGroupMembers};
use crate::pagination::ListOpt;
use crate::request::{item_path, segment};
use http::Method;
use serde::Serialize;

impl Entity for Consumer {
    const COLLECTION: &'static str = "/consumers";
    const KIND: &'static str = "consumer";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.username.as_deref())
    }
}

impl Entity for ConsumerGroup {
    const COLLECTION: &'static str = "/consumer_groups";
    const KIND: &'static str = "consumer group";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

#[derive(Serialize)]
struct CustomIdQuery<'a> {
    custom_id: &'a str,
}

#[derive(Serialize)]
struct Membership<'a> {
    consumer: &'a str,
}

impl EntityService<'_, Consumer> {
    /// The consumer whose `custom_id` matches exactly.
    ///
    /// # Errors
    /// `NotFound` when no consumer has that custom id; `BadRequest` when it is
    /// empty.
    pub async fn get_by_custom_id(&self, custom_id: &str) -> Result<Consumer> {
        if custom_id.is_empty() {
            return Err(Error::invalid("custom_id cannot be empty"));
        }
        let page: crate::pagination::Page<Consumer> = self
            .client
            .get_json_with(Consumer::COLLECTION, &CustomIdQuery { custom_id })
            .await?;
        page.data
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("no consumer with custom_id {custom_id:?}")))
    }

    /// Groups `consumer` belongs to.
    ///
    /// # Errors
    /// `BadRequest` for an invalid consumer identifier; API errors.
    pub async fn list_consumer_groups(&self, consumer: &str) -> Result<Vec<ConsumerGroup>> {
        let path = nested("consumers", "consumer", consumer, "consumer_groups")?;
        self.client.collect_all(&path, None, false).await
    }
}

impl EntityService<'_, ConsumerGroup> {
    /// # Errors
    /// `BadRequest` for an invalid group identifier; API errors.
    pub async fn list_consumers(&self, group: &str) -> Result<Vec<Consumer>> {
        let path = nested("consumer_groups", "consumer group", group, "consumers")?;
        self.client.collect_all(&path, None, false).await
    }

    /// Add `consumer` (id or username) to `group`.
    ///
    /// # Errors
    /// `BadRequest` for invalid identifiers; API errors.
    pub async fn add_consumer(&self, group: &str, consumer: &str) -> Result<ConsumerGroupMembers> {
        let path = nested("consumer_groups", "consumer group", group, "consumers")?;
        let body = Membership {
            consumer: segment("consumer", consumer)?,
        };
        self.client.send_json(Method::POST, &path, &body).await
    }

    /// # Errors
    /// `BadRequest` for invalid identifiers; API errors.
    pub async fn remove_consumer(&self, group: &str, consumer: &str) -> Result<()> {
        let members = nested("consumer_groups", "consumer group", group, "consumers")?;
        self.client
            .delete_path(&item_path(&members, "consumer", consumer)?)
            .await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::Client;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn custom_id_lookup() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/consumers").query_param("custom_id", "ext-1");
            then.status(200)
                .json_body(json!({"data": [{"id": "c1", "username": "bob", "custom_id": "ext-1"}]}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/consumers").query_param("custom_id", "missing");
            then.status(200).json_body(json!({"data": []}));
        });

        let client = Client::new(server.base_url()).unwrap();
        let consumer = client.consumers().get_by_custom_id("ext-1").await.unwrap();
        assert_eq!(consumer.username.as_deref(), Some("bob"));

        let err = client.consumers().get_by_custom_id("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn group_membership() {
        let server = MockServer::start();
        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/consumer_groups/gold/consumers")
                .json_body(json!({"consumer": "bob"}));
            then.status(201).json_body(json!({
                "consumer_group": {"id": "g1", "name": "gold"},
                "consumers": [{"id": "c1", "username": "bob"}]
            }));
        });
        let remove = server.mock(|when, then| {
            when.method(DELETE).path("/consumer_groups/gold/consumers/bob");
            then.status(204);
        });
        let groups = server.mock(|when, then| {
            when.method(GET).path("/consumers/bob/consumer_groups");
            then.status(200).json_body(json!({"data": [{"id": "g1", "name": "gold"}], "next": null}));
        });

        let client = Client::new(server.base_url()).unwrap();
        let members = client.consumer_groups().add_consumer("gold", "bob").await.unwrap();
        assert_eq!(members.consumers.len(), 1);
        assert_eq!(members.consumer_group.unwrap().name.as_deref(), Some("gold"));

        let listed = client.consumers().list_consumer_groups("bob").await.unwrap();
        assert_eq!(listed[0].name.as_deref(), Some("gold"));

        client.consumer_groups().remove_consumer("gold", "bob").await.unwrap();
        add.assert();
        groups.assert();
        remove.assert();
    }
}
