//! Authentication extractors.
//!
//! Provides extractors for requiring a verified bearer token in route
//! handlers. Verification is fully stateless: the token itself carries the
//! caller's identity and role, and no session store is consulted.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use catalog_core::{Role, UserId};

use crate::error::AppError;
use crate::state::AppState;

/// The verified identity attached to a request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    /// The caller's user ID, from the token's subject claim.
    pub id: UserId,
    /// The caller's role at token issue time.
    pub role: Role,
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(current): RequireAuth) -> impl IntoResponse {
///     format!("caller {} ({})", current.id, current.role)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a valid bearer token with the admin role.
///
/// Rejects with `Forbidden` when the token is valid but the caller is not
/// an admin.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state)?))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = authenticate(parts, state)?;
        if !current.role.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(Self(current))
    }
}

/// Extract and verify the `Authorization: Bearer <token>` header.
fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthenticated("Access denied"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthenticated("Access denied"))?;

    let (id, role) = state
        .tokens()
        .verify(token)
        .map_err(|_| AppError::Unauthenticated("Invalid token"))?;

    Ok(CurrentUser { id, role })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::http::Request;
    use secrecy::SecretString;

    use super::*;
    use crate::config::{ProductReadPolicy, ServerConfig};

    fn test_state() -> AppState {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/catalog_test"),
            host: "127.0.0.1".parse().expect("addr"),
            port: 0,
            jwt_secret: SecretString::from("k9#mQ2$xT7@wL4!nR8%bV3^zD6&pS1*f"),
            allowed_origins: Vec::new(),
            upload_dir: PathBuf::from("public/uploads"),
            token_ttl: None,
            product_read_policy: ProductReadPolicy::Open,
        };
        // connect_lazy: no database needed until a query runs, and these
        // tests never run one.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/catalog_test")
            .expect("lazy pool");
        AppState::new(config, pool)
    }

    fn parts_with_auth(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/products");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (parts, ()) = builder.body(()).expect("request").into_parts();
        parts
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthenticated() {
        let state = test_state();
        let mut parts = parts_with_auth(None);
        let err = RequireAuth::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .expect_err("must reject");
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_non_bearer_header_is_unauthenticated() {
        let state = test_state();
        let mut parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        let err = RequireAuth::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .expect_err("must reject");
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthenticated() {
        let state = test_state();
        let mut parts = parts_with_auth(Some("Bearer not.a.token"));
        let err = RequireAuth::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .expect_err("must reject");
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let state = test_state();
        let token = state
            .tokens()
            .issue(UserId::new(42), Role::User)
            .expect("issue");
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));

        let RequireAuth(current) = RequireAuth::from_request_parts(&mut parts, &state)
            .await
            .expect("must accept");
        assert_eq!(current.id, UserId::new(42));
        assert_eq!(current.role, Role::User);
    }

    #[tokio::test]
    async fn test_admin_gate_rejects_regular_user() {
        let state = test_state();
        let token = state
            .tokens()
            .issue(UserId::new(42), Role::User)
            .expect("issue");
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));

        let err = RequireAdmin::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .expect_err("must reject");
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_admin_gate_accepts_admin() {
        let state = test_state();
        let token = state
            .tokens()
            .issue(UserId::new(1), Role::Admin)
            .expect("issue");
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));

        let RequireAdmin(current) = RequireAdmin::from_request_parts(&mut parts, &state)
            .await
            .expect("must accept");
        assert!(current.role.is_admin());
    }
}
