//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use catalog_core::{Email, Role, UserId};

/// A catalog user (domain type).
///
/// The password hash is deliberately not part of this type; repositories
/// return it separately on the authentication paths, so a `User` can be
/// serialized into responses without ever carrying the hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address (unique across accounts).
    pub email: Email,
    /// Role governing authorization decisions.
    pub role: Role,
    /// Stored file name of the profile picture, if one was uploaded.
    #[serde(rename = "profile")]
    pub profile_image: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_shape() {
        let user = User {
            id: UserId::new(1),
            name: "Ada".to_owned(),
            email: Email::parse("ada@example.com").expect("valid email"),
            role: Role::Admin,
            profile_image: Some("logo-1700000000000.jpg".to_owned()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&user).expect("serialize");
        assert_eq!(value["id"], 1);
        assert_eq!(value["role"], "admin");
        assert_eq!(value["profile"], "logo-1700000000000.jpg");
        // The hash is not part of the type, so it can never leak.
        assert!(value.get("password").is_none());
        assert!(value.get("passwordHash").is_none());
    }
}
