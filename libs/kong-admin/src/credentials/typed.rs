use super::{CredentialKind, CredentialOptions, CredentialService, consumer_collection, top_level_collection};
use crate::client::{Client, decode};
use crate::error::{Error, Result};
use crate::models::{Acl, BasicAuth, HmacAuth, JwtAuth, KeyAuth, MtlsAuth, Oauth2Credential};
use crate::pagination::ListOpt;
use crate::request::Response;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// A typed credential record and the kind it is stored as.
pub trait Credential: Serialize + DeserializeOwned + 'static {
    const KIND: CredentialKind;
}

impl Credential for BasicAuth {
    const KIND: CredentialKind = CredentialKind::BasicAuth;
}

impl Credential for KeyAuth {
    const KIND: CredentialKind = CredentialKind::KeyAuth;
}

impl Credential for HmacAuth {
    const KIND: CredentialKind = CredentialKind::HmacAuth;
}

impl Credential for JwtAuth {
    const KIND: CredentialKind = CredentialKind::JwtAuth;
}

impl Credential for Acl {
    const KIND: CredentialKind = CredentialKind::Acl;
}

impl Credential for Oauth2Credential {
    const KIND: CredentialKind = CredentialKind::Oauth2;
}

impl Credential for MtlsAuth {
    const KIND: CredentialKind = CredentialKind::MtlsAuth;
}

/// Typed view of one credential kind over [`CredentialService`].
pub struct Credentials<'a, T> {
    raw: CredentialService<'a>,
    client: &'a Client,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Credentials<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Credentials<'_, T> {}

impl<T> std::fmt::Debug for Credentials<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("credential", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

fn to_record<T: Serialize>(credential: &T) -> Result<Value> {
    serde_json::to_value(credential).map_err(|e| Error::Encode(format!("credential: {e}")))
}

fn typed<T: DeserializeOwned>(response: Response<Bytes>) -> Result<T> {
    decode(response.status, response.data)
}

impl<'a, T: Credential> Credentials<'a, T> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            raw: CredentialService::new(client),
            client,
            marker: PhantomData,
        }
    }

    /// # Errors
    /// See [`CredentialService::create`].
    pub async fn create(&self, consumer: &str, credential: &T) -> Result<T> {
        self.write(consumer, credential, CredentialOptions::default(), false)
            .await
    }

    /// # Errors
    /// See [`CredentialService::get`].
    pub async fn get(&self, consumer: &str, identifier: &str) -> Result<T> {
        typed(self.raw.get(T::KIND.as_str(), consumer, identifier).await?)
    }

    /// # Errors
    /// See [`CredentialService::get_by_id`].
    pub async fn get_by_id(&self, id: &str) -> Result<T> {
        typed(self.raw.get_by_id(T::KIND.as_str(), id).await?)
    }

    /// # Errors
    /// See [`CredentialService::update`].
    pub async fn update(&self, consumer: &str, credential: &T) -> Result<T> {
        self.write(consumer, credential, CredentialOptions::default(), true)
            .await
    }

    /// # Errors
    /// See [`CredentialService::delete`].
    pub async fn delete(&self, consumer: &str, identifier: &str) -> Result<()> {
        self.raw.delete(T::KIND.as_str(), consumer, identifier).await
    }

    /// One page across all consumers.
    ///
    /// # Errors
    /// API, transport and decode errors.
    pub async fn list(&self, opts: Option<&ListOpt>) -> Result<(Vec<T>, Option<ListOpt>)> {
        self.client
            .list_page(&top_level_collection(T::KIND.as_str())?, opts)
            .await
    }

    /// One page of `consumer`'s credentials.
    ///
    /// # Errors
    /// API, transport and decode errors.
    pub async fn list_for_consumer(
        &self,
        consumer: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<T>, Option<ListOpt>)> {
        self.client
            .list_page(&consumer_collection(T::KIND.as_str(), consumer)?, opts)
            .await
    }

    /// Every credential of this kind; see [`CredentialService::list_all`].
    ///
    /// # Errors
    /// API, transport and decode errors.
    pub async fn list_all(&self, tolerate_not_found: bool) -> Result<Vec<T>> {
        self.client
            .collect_all(&top_level_collection(T::KIND.as_str())?, None, tolerate_not_found)
            .await
    }

    async fn write(
        &self,
        consumer: &str,
        credential: &T,
        options: CredentialOptions,
        update: bool,
    ) -> Result<T> {
        let record = to_record(credential)?;
        let kind = T::KIND.as_str();
        let response = if update {
            self.raw.update(kind, consumer, &record, options).await?
        } else {
            self.raw.create(kind, consumer, &record, options).await?
        };
        typed(response)
    }
}

impl Credentials<'_, BasicAuth> {
    /// Create, optionally storing the password without hashing.
    ///
    /// # Errors
    /// See [`CredentialService::create`].
    pub async fn create_with_options(
        &self,
        consumer: &str,
        credential: &BasicAuth,
        options: CredentialOptions,
    ) -> Result<BasicAuth> {
        self.write(consumer, credential, options, false).await
    }

    /// Update, optionally storing the password without hashing.
    ///
    /// # Errors
    /// See [`CredentialService::update`].
    pub async fn update_with_options(
        &self,
        consumer: &str,
        credential: &BasicAuth,
        options: CredentialOptions,
    ) -> Result<BasicAuth> {
        self.write(consumer, credential, options, true).await
    }
}

impl Client {
    #[must_use]
    pub fn basic_auths(&self) -> Credentials<'_, BasicAuth> {
        Credentials::new(self)
    }

    #[must_use]
    pub fn key_auths(&self) -> Credentials<'_, KeyAuth> {
        Credentials::new(self)
    }

    #[must_use]
    pub fn hmac_auths(&self) -> Credentials<'_, HmacAuth> {
        Credentials::new(self)
    }

    #[must_use]
    pub fn jwt_auths(&self) -> Credentials<'_, JwtAuth> {
        Credentials::new(self)
    }

    #[must_use]
    pub fn acls(&self) -> Credentials<'_, Acl> {
        Credentials::new(self)
    }

    #[must_use]
    pub fn oauth2_credentials(&self) -> Credentials<'_, Oauth2Credential> {
        Credentials::new(self)
    }

    #[must_use]
    pub fn mtls_auths(&self) -> Credentials<'_, MtlsAuth> {
        Credentials::new(self)
    }
}
