//! Account bootstrap command.
//!
//! # Usage
//!
//! ```bash
//! CATALOG_ADMIN_PASSWORD=... catalog-cli admin create \
//!     -e admin@example.com -n "Admin Name"
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   the generic `DATABASE_URL`)
//! - `CATALOG_ADMIN_PASSWORD` - Password for the new account

use sqlx::PgPool;
use thiserror::Error;

use catalog_core::{Email, Role, UserId};
use catalog_server::db::RepositoryError;
use catalog_server::db::users::UserRepository;
use catalog_server::services::auth::{self, MIN_PASSWORD_LENGTH};

/// Errors that can occur during account bootstrap.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, user")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password too short.
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters long")]
    WeakPassword,

    /// Password hashing failed.
    #[error("Password hashing failed")]
    Hash,

    /// Account already exists.
    #[error("Account already exists with email: {0}")]
    UserExists(String),

    /// Repository error.
    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Create an account directly in the database.
///
/// # Errors
///
/// Returns `AdminError` if validation fails, the database is unreachable,
/// or the email is already taken.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<UserId, AdminError> {
    dotenvy::dotenv().ok();

    let role: Role = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    let password_hash = auth::hash_password(password).map_err(|_| AdminError::Hash)?;

    let database_url = std::env::var("CATALOG_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| AdminError::MissingEnvVar("CATALOG_DATABASE_URL"))?;

    tracing::info!("Connecting to catalog database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Creating {} account: {}", role, email);
    let user = UserRepository::new(&pool)
        .create(name, &email, &password_hash, role)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!("Created account {} ({})", user.id, user.email);
    Ok(user.id)
}
