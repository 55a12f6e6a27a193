use super::nested;
use crate::entity::{Entity, EntityService};
use crate::error::Result;
use crate::models::{CaCertificate, Certificate, Sni};
use crate::pagination::ListOpt;

impl Entity for Certificate {
    const COLLECTION: &'static str = "/certificates";
    const KIND: &'static str = "certificate";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Entity for CaCertificate {
    const COLLECTION: &'static str = "/ca_certificates";
    const KIND: &'static str = "CA certificate";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Entity for Sni {
    const COLLECTION: &'static str = "/snis";
    const KIND: &'static str = "SNI";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

impl EntityService<'_, Sni> {
    /// SNIs bound to `certificate`.
    ///
    /// # Errors
    /// `BadRequest` for an invalid certificate id; API errors.
    pub async fn list_for_certificate(
        &self,
        certificate: &str,
        opts: Option<&ListOpt>,
    ) -> Result<(Vec<Sni>, Option<ListOpt>)> {
        let path = nested("certificates", "certificate", certificate, "snis")?;
        self.client.list_page(&path, opts).await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::Client;
    use crate::models::Certificate;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn snis_of_certificate() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/certificates/c1/snis");
            then.status(200).json_body(json!({
                "data": [{"id": "n1", "name": "example.com", "certificate": {"id": "c1"}}],
                "offset": "next-page"
            }));
        });

        let client = Client::new(server.base_url()).unwrap();
        let (snis, next) = client.snis().list_for_certificate("c1", None).await.unwrap();
        assert_eq!(snis[0].name.as_deref(), Some("example.com"));
        assert_eq!(next.unwrap().offset.as_deref(), Some("next-page"));
    }

    #[tokio::test]
    async fn certificate_update_requires_id() {
        let server = MockServer::start();
        let client = Client::new(server.base_url()).unwrap();
        let cert = Certificate {
            cert: Some("-----BEGIN CERTIFICATE-----".into()),
            ..Certificate::default()
        };
        assert!(client.certificates().update(&cert).await.unwrap_err().is_bad_request());
    }
}
