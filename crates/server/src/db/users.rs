//! User repository for database operations.
//!
//! Queries are runtime-checked (`query_as`/`query_scalar`); row types are
//! converted into domain types explicitly so invalid stored data surfaces
//! as `DataCorruption` instead of a panic.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use catalog_core::{Email, Role, UserId};

use super::{RepositoryError, SortOrder, map_unique_violation};
use crate::models::User;

const USER_COLUMNS: &str = "id, name, email, role, profile_image, created_at, updated_at";

/// Sortable columns for user listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortKey {
    Id,
    #[default]
    Name,
    Email,
    Role,
    CreatedAt,
}

impl UserSortKey {
    /// Parse a query-string sort field. Returns `None` for unknown fields.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "role" => Some(Self::Role),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
            Self::Role => "role",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    role: String,
    profile_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = self.role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(User {
            id: self.id,
            name: self.name,
            email,
            role,
            profile_image: self.profile_image,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user.
    ///
    /// The insert is atomic: a concurrent registration with the same email
    /// loses at the unique constraint, not at a pre-check.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already in use,
    /// `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(name)
            .bind(email.as_str())
            .bind(password_hash)
            .bind(role.as_str())
            .fetch_one(self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "User already exists"))?;

        row.into_user()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user together with their password hash, by email.
    ///
    /// Only the authentication paths should call this; everything else gets
    /// hash-free [`User`] values.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_auth_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct AuthRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1");
        let row: Option<AuthRow> = sqlx::query_as(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some((r.user.into_user()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Get a user's password hash by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(hash)
    }

    /// Whether a user with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: UserId) -> Result<bool, RepositoryError> {
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// List users with the total account count.
    ///
    /// Pagination applies only when a limit is given; the total is computed
    /// independent of the page window.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        sort: UserSortKey,
        order: SortOrder,
        page: i64,
        limit: Option<i64>,
    ) -> Result<(Vec<User>, i64), RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users ORDER BY "));
        qb.push(sort.column()).push(" ").push(order.as_sql());
        if let Some(limit) = limit {
            let offset = (page.max(1) - 1) * limit;
            qb.push(" LIMIT ")
                .push_bind(limit)
                .push(" OFFSET ")
                .push_bind(offset);
        }

        let rows: Vec<UserRow> = qb.build_query_as().fetch_all(self.pool).await?;
        let users = rows
            .into_iter()
            .map(UserRow::into_user)
            .collect::<Result<Vec<_>, _>>()?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;

        Ok((users, total))
    }

    /// Update a user's display name.
    ///
    /// Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_name(
        &self,
        id: UserId,
        name: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "UPDATE users SET name = $2, updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Replace a user's password hash.
    ///
    /// Returns `false` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Point a user's profile reference at a stored file.
    ///
    /// Returns `false` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_profile_image(
        &self,
        id: UserId,
        file_name: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET profile_image = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(file_name)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
