//! Signed bearer tokens.
//!
//! Stateless HS256 tokens carrying the caller's identity and role. There is
//! no session store; a token is valid until it expires (or forever, when no
//! TTL is configured - matching deployments that rely on secret rotation).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use catalog_core::{Role, UserId};

/// Errors that can occur when issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token is malformed, has a bad signature, or is expired.
    #[error("invalid token")]
    Invalid,

    /// Signing failed.
    #[error("failed to sign token")]
    Signing,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user's ID.
    sub: i32,
    /// The user's role at issue time.
    role: Role,
    /// Issued-at, seconds since the epoch.
    iat: i64,
    /// Expiry; absent when issued without a TTL.
    #[serde(skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// Issues and verifies signed bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Option<Duration>,
    validation: Validation,
}

impl TokenService {
    /// Create a token service from the signing secret.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Option<Duration>) -> Self {
        let secret_bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens issued without a TTL carry no `exp` claim; expiry is
        // checked only when the claim is present.
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret_bytes),
            decoding: DecodingKey::from_secret(secret_bytes),
            ttl,
            validation,
        }
    }

    /// Issue a token embedding the user's identity and role.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.as_i32(),
            role,
            iat: now,
            exp: self.ttl.map(|ttl| now + i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Signing)
    }

    /// Verify a token and extract the caller's identity and role.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the token is malformed, carries a
    /// bad signature, or is expired.
    pub fn verify(&self, token: &str) -> Result<(UserId, Role), TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        Ok((UserId::new(data.claims.sub), data.claims.role))
    }
}
