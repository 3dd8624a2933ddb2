//! User route handlers.

use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use catalog_core::Role;

use crate::db::users::{UserRepository, UserSortKey};
use crate::db::SortOrder;
use crate::error::{AppError, FieldError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::User;
use crate::routes::{MessageResponse, non_empty, read_upload_form, remove_dangling_upload};
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: the bearer token plus the account it belongs to.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Query parameters for the user listing.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// User listing response.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: i64,
}

/// Self-update request body; only the name is mutable through this path.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// Password-change request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account. Admin only.
pub async fn register(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let mut errors = Vec::new();
    if req.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if catalog_core::Email::parse(&req.email).is_err() {
        errors.push(FieldError::new("email", "Please include a valid email"));
    }
    if req.password.len() < crate::services::auth::MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters long",
        ));
    }
    let role = match req.role.parse::<Role>() {
        Ok(role) => Some(role),
        Err(_) => {
            errors.push(FieldError::new(
                "role",
                "Role must be either 'admin' or 'user'",
            ));
            None
        }
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let role = role.unwrap_or_default();

    AuthService::new(state.pool())
        .register(req.name.trim(), &req.email, &req.password, role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// Login with email and password.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let mut errors = Vec::new();
    if req.email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    }
    if req.password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let (token, user) = AuthService::new(state.pool())
        .login(&req.email, &req.password, state.tokens())
        .await?;

    Ok(Json(LoginResponse { token, user }))
}

/// List all accounts. Admin only. Pagination applies only when a limit is
/// explicitly requested.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>> {
    let sort = match non_empty(query.sort) {
        None => UserSortKey::default(),
        Some(s) => UserSortKey::parse(&s)
            .ok_or_else(|| AppError::validation("sort", "Cannot sort by this field"))?,
    };
    let order = query
        .order
        .as_deref()
        .map(SortOrder::parse)
        .unwrap_or_default();
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.filter(|l| *l > 0);

    let (users, total) = UserRepository::new(state.pool())
        .list(sort, order, page, limit)
        .await?;

    Ok(Json(UserListResponse { users, total }))
}

/// Upload (or replace) the caller's profile picture.
///
/// The new file is stored first; if updating the account record then fails,
/// the freshly stored file is removed so nothing dangles.
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>> {
    let form = read_upload_form(&mut multipart, "profile").await?;

    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_id(current.id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    let new_file = state
        .images()
        .replace(user.profile_image.as_deref(), form.file.unwrap_or_default())
        .await?;

    match users.set_profile_image(current.id, &new_file).await {
        Ok(true) => Ok(Json(MessageResponse::new(
            "Profile picture uploaded successfully",
        ))),
        Ok(false) => {
            remove_dangling_upload(&state, &new_file).await;
            Err(AppError::NotFound("User not found"))
        }
        Err(e) => {
            remove_dangling_upload(&state, &new_file).await;
            Err(e.into())
        }
    }
}

/// Update the caller's display name.
pub async fn update_self(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("name", "Name is required"));
    }

    UserRepository::new(state.pool())
        .update_name(current.id, req.name.trim())
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// Change the caller's password after verifying the old one.
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool())
        .change_password(current.id, &req.old_password, &req.new_password)
        .await?;

    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// The caller's own account, without the password hash.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(user))
}
