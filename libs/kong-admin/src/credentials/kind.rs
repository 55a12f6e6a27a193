use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Paths and options for one credential kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialEndpoints {
    /// Segment under `/consumers/{consumer}/`.
    pub consumer_segment: &'static str,
    /// Top-level collection segment.
    pub top_level_segment: &'static str,
    /// Whether writes accept `skip_hash=true`.
    pub supports_skip_hash: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    KeyAuth,
    BasicAuth,
    HmacAuth,
    JwtAuth,
    Acl,
    Oauth2,
    MtlsAuth,
}

impl CredentialKind {
    pub const ALL: [Self; 7] = [
        Self::KeyAuth,
        Self::BasicAuth,
        Self::HmacAuth,
        Self::JwtAuth,
        Self::Acl,
        Self::Oauth2,
        Self::MtlsAuth,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeyAuth => "key-auth",
            Self::BasicAuth => "basic-auth",
            Self::HmacAuth => "hmac-auth",
            Self::JwtAuth => "jwt-auth",
            Self::Acl => "acl",
            Self::Oauth2 => "oauth2",
            Self::MtlsAuth => "mtls-auth",
        }
    }

    #[must_use]
    pub const fn endpoints(self) -> CredentialEndpoints {
        let (consumer_segment, top_level_segment) = match self {
            Self::KeyAuth => ("key-auth", "key-auths"),
            Self::BasicAuth => ("basic-auth", "basic-auths"),
            Self::HmacAuth => ("hmac-auth", "hmac-auths"),
            Self::JwtAuth => ("jwt", "jwts"),
            Self::Acl => ("acls", "acls"),
            Self::Oauth2 => ("oauth2", "oauth2"),
            Self::MtlsAuth => ("mtls-auth", "mtls-auths"),
        };
        CredentialEndpoints {
            consumer_segment,
            top_level_segment,
            supports_skip_hash: matches!(self, Self::BasicAuth),
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::invalid(format!("unknown credential kind {s:?}")))
    }
}
