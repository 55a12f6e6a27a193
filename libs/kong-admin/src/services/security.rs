use crate::entity::Entity;
use crate::models::{Key, KeySet, License, Vault};

impl Entity for Vault {
    const COLLECTION: &'static str = "/vaults";
    const KIND: &'static str = "vault";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.prefix.as_deref())
    }
}

impl Entity for Key {
    const COLLECTION: &'static str = "/keys";
    const KIND: &'static str = "key";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

impl Entity for KeySet {
    const COLLECTION: &'static str = "/key-sets";
    const KIND: &'static str = "key set";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

impl Entity for License {
    const COLLECTION: &'static str = "/licenses";
    const KIND: &'static str = "license";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::Client;
    use crate::models::{KeySet, Vault};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn vault_update_by_prefix() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/vaults/env-secrets")
                .json_body(json!({"prefix": "env-secrets", "config": {"prefix": "SECRET_"}}));
            then.status(200)
                .json_body(json!({"id": "v1", "name": "env", "prefix": "env-secrets"}));
        });

        let client = Client::new(server.base_url()).unwrap();
        let config = kong_utils::values::configuration(json!({"prefix": "SECRET_"}));
        let vault = client
            .vaults()
            .update(&Vault {
                prefix: Some("env-secrets".into()),
                config,
                ..Vault::default()
            })
            .await
            .unwrap();
        mock.assert();
        assert_eq!(vault.id.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn key_set_paths_use_dash() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/key-sets");
            then.status(201).json_body(json!({"id": "ks1", "name": "signing"}));
        });

        let client = Client::new(server.base_url()).unwrap();
        client
            .key_sets()
            .create(&KeySet {
                name: Some("signing".into()),
                ..KeySet::default()
            })
            .await
            .unwrap();
        mock.assert();
    }
}
