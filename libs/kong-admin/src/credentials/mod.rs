//! Consumer credentials.
//!
//! [`CredentialService`] drives every credential kind through one table of
//! endpoints and works on raw JSON, so each typed wrapper in [`Credentials`]
//! keeps the server's view of the record (hashed passwords, generated keys).

mod kind;
mod typed;

pub use kind::{CredentialEndpoints, CredentialKind};
pub use typed::{Credential, Credentials};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::pagination::ListOpt;
use crate::request::{Response, item_path, segment};
use bytes::Bytes;
use http::Method;
use serde::Serialize;
use serde_json::Value;

/// Per-call write options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialOptions {
    /// Store the password as given instead of hashing it. basic-auth only.
    pub skip_hash: bool,
}

impl CredentialOptions {
    #[must_use]
    pub const fn skip_hash() -> Self {
        Self { skip_hash: true }
    }
}

#[derive(Debug, Serialize)]
struct WriteQuery {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    skip_hash: bool,
}

/// Table-driven CRUD over credentials of any kind, addressed by kind name.
#[derive(Debug, Clone, Copy)]
pub struct CredentialService<'a> {
    client: &'a Client,
}

fn endpoints(kind: &str) -> Result<CredentialEndpoints> {
    kind.parse::<CredentialKind>().map(CredentialKind::endpoints)
}

/// `/consumers/{consumer}/{segment}`.
pub(crate) fn consumer_collection(kind: &str, consumer: &str) -> Result<String> {
    let endpoints = endpoints(kind)?;
    Ok(format!(
        "/consumers/{}/{}",
        segment("consumer", consumer)?,
        endpoints.consumer_segment
    ))
}

/// `/{top-level segment}`.
pub(crate) fn top_level_collection(kind: &str) -> Result<String> {
    Ok(format!("/{}", endpoints(kind)?.top_level_segment))
}

/// The record's `id`, if any. Records must be JSON objects.
fn record_id(record: &Value) -> Result<Option<&str>> {
    match record {
        Value::Object(map) => Ok(map
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())),
        Value::Null => Err(Error::invalid("credential record is required")),
        _ => Err(Error::invalid("credential record must be a JSON object")),
    }
}

fn write_query(kind: &str, options: CredentialOptions) -> Result<WriteQuery> {
    if options.skip_hash && !endpoints(kind)?.supports_skip_hash {
        return Err(Error::invalid(format!("{kind} credentials do not accept skip_hash")));
    }
    Ok(WriteQuery {
        skip_hash: options.skip_hash,
    })
}

impl<'a> CredentialService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a credential under `consumer`.
    ///
    /// With an `id` in `record` this is an upsert (`PUT .../{id}`); without
    /// one the server assigns the id (`POST`).
    ///
    /// # Errors
    /// `BadRequest` for an unknown kind, an empty consumer, a missing record or
    /// `skip_hash` on a kind that does not support it; API errors otherwise.
    pub async fn create(
        &self,
        kind: &str,
        consumer: &str,
        record: &Value,
        options: CredentialOptions,
    ) -> Result<Response<Bytes>> {
        let collection = consumer_collection(kind, consumer)?;
        let query = write_query(kind, options)?;
        match record_id(record)? {
            Some(id) => {
                let path = item_path(&collection, "credential id", id)?;
                self.write(Method::PUT, &path, &query, record).await
            }
            None => self.write(Method::POST, &collection, &query, record).await,
        }
    }

    /// `PATCH` the credential identified by `record.id`.
    ///
    /// # Errors
    /// As [`create`](Self::create), plus `BadRequest` when `record` has no id.
    pub async fn update(
        &self,
        kind: &str,
        consumer: &str,
        record: &Value,
        options: CredentialOptions,
    ) -> Result<Response<Bytes>> {
        let collection = consumer_collection(kind, consumer)?;
        let query = write_query(kind, options)?;
        let id = record_id(record)?
            .ok_or_else(|| Error::invalid(format!("{kind} credential id is required for update")))?;
        let path = item_path(&collection, "credential id", id)?;
        self.write(Method::PATCH, &path, &query, record).await
    }

    /// Fetch by id or natural key (username, key, group) under `consumer`.
    ///
    /// The identifier is passed through as given; the gateway decides how to
    /// resolve it.
    ///
    /// # Errors
    /// `BadRequest` for an unknown kind or empty identifiers; API errors.
    pub async fn get(&self, kind: &str, consumer: &str, identifier: &str) -> Result<Response<Bytes>> {
        let path = item_path(
            &consumer_collection(kind, consumer)?,
            "credential identifier",
            identifier,
        )?;
        self.read(&path).await
    }

    /// Fetch by id from the top-level collection, without knowing the consumer.
    ///
    /// # Errors
    /// `BadRequest` for an unknown kind or empty id; API errors.
    pub async fn get_by_id(&self, kind: &str, id: &str) -> Result<Response<Bytes>> {
        let path = item_path(&top_level_collection(kind)?, "credential id", id)?;
        self.read(&path).await
    }

    /// # Errors
    /// `BadRequest` for an unknown kind or empty identifiers; API errors.
    pub async fn delete(&self, kind: &str, consumer: &str, identifier: &str) -> Result<()> {
        let path = item_path(
            &consumer_collection(kind, consumer)?,
            "credential identifier",
            identifier,
        )?;
        self.client.delete_path(&path).await
    }

    /// One page of every consumer's credentials of `kind`.
    ///
    /// # Errors
    /// `BadRequest` for an unknown kind; API errors.
    pub async fn list(
        &self,
        kind: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<Value>, Option<ListOpt>)> {
        self.client.list(&top_level_collection(kind)?, opts).await
    }

    /// One page of `consumer`'s credentials of `kind`.
    ///
    /// # Errors
    /// `BadRequest` for an unknown kind or empty consumer; API errors.
    pub async fn list_for_consumer(
        &self,
        kind: &str,
        consumer: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<Value>, Option<ListOpt>)> {
        self.client.list(&consumer_collection(kind, consumer)?, opts).await
    }

    /// Every credential of `kind`.
    ///
    /// `tolerate_not_found` turns a `404` (kind not enabled on this gateway)
    /// into an empty result.
    ///
    /// # Errors
    /// `BadRequest` for an unknown kind; API errors.
    pub async fn list_all(
        &self,
        kind: &str,
        opts: Option<&ListOpt>,
        tolerate_not_found: bool,
    ) -> Result<Vec<Value>> {
        self.client
            .list_all(&top_level_collection(kind)?, opts, tolerate_not_found)
            .await
    }

    async fn read(&self, path: &str) -> Result<Response<Bytes>> {
        let request = self.client.new_request(Method::GET, path, None::<&()>, None::<&()>)?;
        self.client.execute_raw(request).await
    }

    async fn write(
        &self,
        method: Method,
        path: &str,
        query: &WriteQuery,
        record: &Value,
    ) -> Result<Response<Bytes>> {
        let request = self.client.new_request(method, path, Some(query), Some(record))?;
        self.client.execute_raw(request).await
    }
}

impl Client {
    /// Credentials of any kind, addressed by kind name.
    #[must_use]
    pub fn credentials(&self) -> CredentialService<'_> {
        CredentialService::new(self)
    }
}
