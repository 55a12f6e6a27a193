//! Generic CRUD over entity collections.

use crate::client::Client;
use crate::error::{Error, Result};
use crate::pagination::ListOpt;
use crate::request::item_path;
use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// A record stored in a top-level collection.
pub trait Entity: Serialize + DeserializeOwned + 'static {
    /// Collection path, e.g. `/services`.
    const COLLECTION: &'static str;
    /// Singular name used in error messages.
    const KIND: &'static str;

    fn id(&self) -> Option<&str>;

    /// Identifier used to address an existing record: the id, else the
    /// natural key the gateway also accepts in paths.
    fn key(&self) -> Option<&str> {
        self.id()
    }
}

/// CRUD and listing for one entity collection; obtained from the `Client`
/// accessors such as [`Client::services`].
pub struct EntityService<'a, T> {
    pub(crate) client: &'a Client,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityService<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityService<'_, T> {}

impl<T> std::fmt::Debug for EntityService<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityService")
            .field("entity", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<'a, T: Entity> EntityService<'a, T> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            marker: PhantomData,
        }
    }

    /// `PUT /<collection>/<id>` when `entity` has an id, else
    /// `POST /<collection>`.
    ///
    /// # Errors
    /// API and transport errors.
    pub async fn create(&self, entity: &T) -> Result<T> {
        self.client.create_in(T::COLLECTION, entity).await
    }

    /// # Errors
    /// `BadRequest` for an invalid identifier; `NotFound` and other API errors.
    pub async fn get(&self, id_or_key: &str) -> Result<T> {
        self.client.get_in(T::COLLECTION, T::KIND, id_or_key).await
    }

    /// `PATCH` the record addressed by the entity's id or natural key.
    ///
    /// # Errors
    /// `BadRequest` when the entity carries neither.
    pub async fn update(&self, entity: &T) -> Result<T> {
        self.client.update_in(T::COLLECTION, entity).await
    }

    /// # Errors
    /// `BadRequest` for an invalid identifier; API errors.
    pub async fn delete(&self, id_or_key: &str) -> Result<()> {
        self.client.delete_in(T::COLLECTION, T::KIND, id_or_key).await
    }

    /// One page of the collection.
    ///
    /// # Errors
    /// API, transport and decode errors.
    pub async fn list(&self, opts: Option<&ListOpt>) -> Result<(Vec<T>, Option<ListOpt>)> {
        self.client.list_page(T::COLLECTION, opts).await
    }

    /// Every record in the collection.
    ///
    /// # Errors
    /// As [`list`](Self::list).
    pub async fn list_all(&self) -> Result<Vec<T>> {
        self.client.collect_all(T::COLLECTION, None, false).await
    }

    /// Every record matching `opts` (tags and page size).
    ///
    /// # Errors
    /// As [`list`](Self::list).
    pub async fn list_all_with(&self, opts: &ListOpt) -> Result<Vec<T>> {
        self.client.collect_all(T::COLLECTION, Some(opts), false).await
    }
}

impl Client {
    pub(crate) async fn create_in<T: Entity>(&self, collection: &str, entity: &T) -> Result<T> {
        match kong_utils::values::non_empty(entity.id()) {
            Some(id) => {
                let path = item_path(collection, T::KIND, id)?;
                self.send_json(Method::PUT, &path, entity).await
            }
            None => self.send_json(Method::POST, collection, entity).await,
        }
    }

    pub(crate) async fn get_in<T: DeserializeOwned>(
        &self,
        collection: &str,
        kind: &str,
        id_or_key: &str,
    ) -> Result<T> {
        self.get_json(&item_path(collection, kind, id_or_key)?).await
    }

    pub(crate) async fn update_in<T: Entity>(&self, collection: &str, entity: &T) -> Result<T> {
        let key = kong_utils::values::non_empty(entity.key()).ok_or_else(|| {
            Error::invalid(format!("{} id or key is required for update", T::KIND))
        })?;
        let path = item_path(collection, T::KIND, key)?;
        self.send_json(Method::PATCH, &path, entity).await
    }

    pub(crate) async fn delete_in(&self, collection: &str, kind: &str, id_or_key: &str) -> Result<()> {
        self.delete_path(&item_path(collection, kind, id_or_key)?).await
    }
}
