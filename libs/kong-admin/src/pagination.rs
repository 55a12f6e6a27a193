//! List options and the offset-based pagination engine.

use crate::client::Client;
use crate::error::Result;
use crate::pager::{ItemStream, PageStream};
use futures_core::Stream;
use futures_util::StreamExt;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Options for one list request.
///
/// `size == 0` leaves the page size to the server. Tags are sent as a single
/// `tags` parameter, joined with `,` when every tag must match and with `/`
/// when any tag may match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOpt {
    pub size: u32,
    pub offset: Option<String>,
    pub tags: Vec<String>,
    pub match_all_tags: bool,
}

impl ListOpt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: impl Into<String>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn match_all_tags(mut self, match_all: bool) -> Self {
        self.match_all_tags = match_all;
        self
    }

    /// Options for the page after this one: same size and tags, new offset.
    #[must_use]
    pub fn next_page(&self, offset: String) -> Self {
        Self {
            size: self.size,
            offset: Some(offset),
            tags: self.tags.clone(),
            match_all_tags: self.match_all_tags,
        }
    }

    pub(crate) fn query(&self) -> ListQuery<'_> {
        let tags = kong_utils::values::dedup_preserving_order(&self.tags);
        let separator = if self.match_all_tags { "," } else { "/" };
        ListQuery {
            size: (self.size > 0).then_some(self.size),
            offset: kong_utils::values::non_empty(self.offset.as_deref()),
            tags: (!tags.is_empty()).then(|| tags.join(separator)),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ListQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<String>,
}

/// One page of a list response.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Page<T> {
    #[serde(default = "Vec::new", deserialize_with = "lenient_list")]
    pub data: Vec<T>,
    #[serde(default)]
    pub offset: Option<String>,
}

/// Empty collections come back as `[]`, `{}` or `null` depending on the
/// gateway version.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        other => Err(D::Error::custom(format!("expected a list, found {other}"))),
    }
}

impl Client {
    /// Fetch one page of `path`.
    ///
    /// Returns the records and, when the server reported an offset, the options
    /// for the next page.
    pub async fn list(
        &self,
        path: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<Value>, Option<ListOpt>)> {
        self.list_page(path, opts).await
    }

    /// Fetch every page of `path`, concatenated in server order.
    ///
    /// With `tolerate_not_found`, a `404` on any page ends the walk and the
    /// records gathered so far are returned.
    pub async fn list_all(
        &self,
        path: &str,
        opts: Option<&ListOpt>,
        tolerate_not_found: bool,
    ) -> Result<Vec<Value>> {
        self.collect_all(path, opts, tolerate_not_found).await
    }

    /// Pages of `path` as a stream, decoded as `T`.
    pub fn pages<T>(
        &self,
        path: &str,
        opts: Option<&ListOpt>,
    ) -> impl Stream<Item = Result<Vec<T>>> + 'static
    where
        T: DeserializeOwned + 'static,
    {
        let client = self.clone();
        let path = path.to_owned();
        PageStream::new(
            opts.cloned().unwrap_or_default(),
            self.cancellation_token().cloned(),
            move |opts: ListOpt| {
                let client = client.clone();
                let path = path.clone();
                async move { client.list_page::<T>(&path, Some(&opts)).await }
            },
        )
    }

    /// Records of `path` as a stream, one page fetched at a time.
    pub fn items<T>(&self, path: &str, opts: Option<&ListOpt>) -> impl Stream<Item = Result<T>> + 'static
    where
        T: DeserializeOwned + 'static,
    {
        ItemStream::new(self.pages::<T>(path, opts))
    }

    pub(crate) async fn list_page<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<T>, Option<ListOpt>)> {
        let opts = opts.cloned().unwrap_or_default();
        let page: Page<T> = self.get_json_with(path, &opts.query()).await?;
        let next = kong_utils::values::non_empty(page.offset.as_deref())
            .map(|offset| opts.next_page(offset.to_owned()));
        Ok((page.data, next))
    }

    pub(crate) async fn collect_all<T>(
        &self,
        path: &str,
        opts: Option<&ListOpt>,
        tolerate_not_found: bool,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned + 'static,
    {
        let mut pages = std::pin::pin!(self.pages::<T>(path, opts));
        let mut all = Vec::new();
        while let Some(page) = pages.next().await {
            match page {
                Ok(items) => all.extend(items),
                Err(e) if tolerate_not_found && e.is_not_found() => break,
                Err(e) => return Err(e),
            }
        }
        Ok(all)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn encoded(opts: &ListOpt) -> String {
        serde_urlencoded::to_string(opts.query()).unwrap()
    }

    #[test]
    fn default_options_add_nothing() {
        assert_eq!(encoded(&ListOpt::new()), "");
    }

    #[test]
    fn tags_join_by_match_mode() {
        let any = ListOpt::new().tags(["a", "b", "a"]);
        assert_eq!(encoded(&any), "tags=a%2Fb");

        let all = any.clone().match_all_tags(true);
        assert_eq!(encoded(&all), "tags=a%2Cb");
    }

    #[test]
    fn size_and_offset_encoded() {
        let opts = ListOpt::new().size(10).offset("abc");
        assert_eq!(encoded(&opts), "size=10&offset=abc");
    }

    #[test]
    fn next_page_keeps_filters() {
        let opts = ListOpt::new().size(5).tag("x").match_all_tags(true);
        let next = opts.next_page("o1".to_owned());
        assert_eq!(next.size, 5);
        assert_eq!(next.tags, vec!["x".to_owned()]);
        assert!(next.match_all_tags);
        assert_eq!(next.offset.as_deref(), Some("o1"));
    }

    #[test]
    fn page_accepts_empty_object_and_null() {
        let page: Page<Value> = serde_json::from_value(json!({"data": {}})).unwrap();
        assert!(page.data.is_empty());
        let page: Page<Value> = serde_json::from_value(json!({"data": null, "offset": null})).unwrap();
        assert!(page.data.is_empty());
        assert!(page.offset.is_none());
        let page: Page<Value> = serde_json::from_value(json!({})).unwrap();
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn list_returns_next_options() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/services").query_param("size", "1");
            then.status(200)
                .json_body(json!({"data": [{"id": "s1"}], "offset": "o1", "next": "/services?offset=o1"}));
        });

        let client = Client::new(server.base_url()).unwrap();
        let (items, next) = client.list("/services", Some(&ListOpt::new().size(1))).await.unwrap();
        assert_eq!(items, vec![json!({"id": "s1"})]);
        let next = next.unwrap();
        assert_eq!(next.offset.as_deref(), Some("o1"));
        assert_eq!(next.size, 1);
    }

    #[tokio::test]
    async fn last_page_has_no_next() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/routes");
            then.status(200).json_body(json!({"data": [], "offset": ""}));
        });

        let client = Client::new(server.base_url()).unwrap();
        let (items, next) = client.list("/routes", None).await.unwrap();
        assert!(items.is_empty());
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn list_all_tolerates_missing_collection() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/consumers/bob/acls");
            then.status(404).json_body(json!({"message": "Not found"}));
        });

        let client = Client::new(server.base_url()).unwrap();
        let all = client.list_all("/consumers/bob/acls", None, true).await.unwrap();
        assert!(all.is_empty());

        let err = client
            .list_all("/consumers/bob/acls", None, false)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_all_keeps_pages_before_a_missing_one() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/key-auths")
                .query_param("size", "2")
                .query_param_missing("offset");
            then.status(200).json_body(json!({
                "data": [{"id": "k1"}, {"id": "k2"}],
                "offset": "o1"
            }));
        });
        let second = server.mock(|when, then| {
            when.method(GET).path("/key-auths").query_param("offset", "o1");
            then.status(404).json_body(json!({"message": "Not found"}));
        });

        let client = Client::new(server.base_url()).unwrap();
        let opts = ListOpt::new().size(2);
        let all = client.list_all("/key-auths", Some(&opts), true).await.unwrap();
        let ids: Vec<_> = all.iter().map(|v| v["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["k1", "k2"]);
        first.assert_calls(1);
        second.assert_calls(1);

        let err = client
            .list_all("/key-auths", Some(&opts), false)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
