use serde::{Deserialize, Serialize};

/// Foreign key to another entity.
///
/// The gateway accepts either field on input and returns `id` on output.
/// Consumers are referenced by `username` instead of `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Reference {
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// The natural name (`username`, then `name`) if set and non-empty, else the id.
    #[must_use]
    pub fn name_or_id(&self) -> Option<&str> {
        kong_utils::values::first_non_empty(&[
            self.username.as_deref(),
            self.name.as_deref(),
            self.id.as_deref(),
        ])
    }
}
