//! Product source.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::Role;

/// Error returned when parsing an unknown product source value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown product source: {0} (expected 'ADMIN' or 'USER')")]
pub struct ProductSourceError(pub String);

/// Who created a product.
///
/// Set once from the creator's role at creation time and immutable
/// thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductSource {
    /// Created by an administrator.
    Admin,
    /// Created by a regular user.
    User,
}

impl ProductSource {
    /// The canonical string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

impl From<Role> for ProductSource {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::User => Self::User,
        }
    }
}

impl fmt::Display for ProductSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductSource {
    type Err = ProductSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            other => Err(ProductSourceError(other.to_owned())),
        }
    }
}
