//! User roles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown role value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0} (expected 'admin' or 'user')")]
pub struct RoleError(pub String);

/// The role of an authenticated caller.
///
/// Roles form a closed set: every authorization decision is an exhaustive
/// match on this enum rather than a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access: manages users, all products, and assignments.
    Admin,
    /// Regular account: sees and manages only products assigned to it.
    #[default]
    User,
}

impl Role {
    /// Whether this role grants administrative access.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// The canonical string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(RoleError(other.to_owned())),
        }
    }
}
