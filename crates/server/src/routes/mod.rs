//! HTTP route handlers for the catalog API.
//!
//! # Route Structure
//!
//! ```text
//! # Users
//! POST /api/users/register           - Create account (admin only)
//! POST /api/users/login              - Login, returns bearer token
//! GET  /api/users                    - List accounts (admin only)
//! POST /api/users/upload-profile-pic - Upload profile picture (multipart "profile")
//! PUT  /api/users/update             - Update own name
//! PUT  /api/users/update-password    - Change own password
//! GET  /api/users/me                 - Own account, without the hash
//!
//! # Products
//! POST   /api/products               - Create product (multipart "logo" + fields)
//! GET    /api/products               - List products (ownership-filtered)
//! GET    /api/products/categories    - Distinct category values
//! GET    /api/products/{id}          - Fetch by id
//! PUT    /api/products/{id}          - Partial update (multipart, optional logo)
//! DELETE /api/products/{id}          - Delete record + logo file
//! POST   /api/products/assign        - Replace ownership list (admin only)
//! ```
//!
//! Stored images are served read-only under `/api/images` (wired in main).

pub mod products;
pub mod users;

use std::collections::HashMap;

use axum::{
    Router,
    extract::Multipart,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/users", user_routes())
        .nest("/api/products", product_routes())
}

/// Create the user routes router.
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/", get(users::list))
        .route("/upload-profile-pic", post(users::upload_profile_picture))
        .route("/update", put(users::update_self))
        .route("/update-password", put(users::update_password))
        .route("/me", get(users::me))
}

/// Create the product routes router.
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(products::create).get(products::list))
        .route("/categories", get(products::categories))
        .route("/assign", post(products::assign))
        .route(
            "/{id}",
            get(products::get_by_id)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Simple `{"message": ...}` response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    message: &'static str,
}

impl MessageResponse {
    pub(crate) const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// A parsed multipart upload: text fields plus at most one file payload.
pub(crate) struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<Vec<u8>>,
}

/// Drain a multipart body, collecting text fields and the bytes of the
/// field named `file_field`.
pub(crate) async fn read_upload_form(
    multipart: &mut Multipart,
    file_field: &str,
) -> Result<UploadForm, AppError> {
    let mut fields = HashMap::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        if name == file_field {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("could not read upload: {e}")))?;
            file = Some(bytes.to_vec());
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("could not read field {name}: {e}")))?;
            fields.insert(name, text);
        }
    }

    Ok(UploadForm { fields, file })
}

/// Treat empty query/form strings as absent, matching the original API.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Cleanup-on-failure: a stored file whose record write failed must not
/// stay behind. Failure to clean up is logged, then the original error
/// propagates from the caller.
pub(crate) async fn remove_dangling_upload(state: &AppState, file_name: &str) {
    if let Err(err) = state.images().delete(file_name).await {
        tracing::error!(file = file_name, error = %err, "failed to clean up dangling upload");
    }
}
