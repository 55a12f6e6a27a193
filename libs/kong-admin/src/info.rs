//! The gateway's root document.

use crate::client::Client;
use crate::error::Result;
use crate::version::{Version, VersionError};
use serde::{Deserialize, Serialize};

/// Selected runtime settings reported under `configuration`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfiguration {
    /// `postgres`, or `off` for DB-less nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rbac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal: Option<bool>,
    /// `traditional`, `control_plane` or `data_plane`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<RuntimeConfiguration>,
}

impl Info {
    /// # Errors
    /// [`VersionError`] when the reported version does not parse.
    pub fn version(&self) -> Result<Version, VersionError> {
        Version::parse(&self.version)
    }

    /// Enterprise builds say so in the version or carry a fourth component.
    #[must_use]
    pub fn is_enterprise(&self) -> bool {
        self.version.contains("enterprise")
            || self.version().is_ok_and(|v| v.revision.is_some())
    }

    #[must_use]
    pub fn is_dbless(&self) -> bool {
        self.configuration
            .as_ref()
            .and_then(|c| c.database.as_deref())
            == Some("off")
    }
}

impl Client {
    /// Fetch and decode the root document.
    ///
    /// # Errors
    /// Transport, API and decode errors.
    pub async fn info(&self) -> Result<Info> {
        self.get_json("/").await
    }
}
