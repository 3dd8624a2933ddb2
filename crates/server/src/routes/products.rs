//! Product route handlers.
//!
//! The upload lifecycle rules live here: field validation happens before
//! the image is stored, and any failure after a file was stored deletes
//! that file before the error surfaces.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use catalog_core::{ProductId, ProductSource, Sku, UserId};

use crate::config::ProductReadPolicy;
use crate::db::SortOrder;
use crate::db::products::{ProductFilter, ProductRepository, ProductSortKey};
use crate::db::users::UserRepository;
use crate::error::{AppError, FieldError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{NewProduct, Product, ProductChanges};
use crate::routes::{MessageResponse, non_empty, read_upload_form, remove_dangling_upload};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
}

/// Product listing response.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: i64,
}

/// Distinct category values.
#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// Assignment request body. Replace semantics: the supplied list becomes
/// the ownership list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub product_id: i32,
    pub user_id: i32,
    pub assigned_to: Vec<i32>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a product from a multipart form (`logo` file + text fields).
///
/// `source` comes from the creator's role; `assignedTo` defaults to the
/// creator when absent.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let mut form = read_upload_form(&mut multipart, "logo").await?;

    let name = form.fields.remove("name").unwrap_or_default().trim().to_owned();
    let sku_raw = form.fields.remove("sku").unwrap_or_default();
    let category = form
        .fields
        .remove("category")
        .unwrap_or_default()
        .trim()
        .to_owned();
    let description = non_empty(form.fields.remove("description"));

    let mut errors = Vec::new();
    if name.is_empty() {
        errors.push(FieldError::new("name", "Product name is required"));
    }
    if let Err(e) = Sku::parse(&sku_raw) {
        errors.push(FieldError::new("sku", e.to_string()));
    }
    if category.is_empty() {
        errors.push(FieldError::new("category", "Category is required"));
    }
    let assigned_to = parse_assigned_to(form.fields.remove("assignedTo"), &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let sku = Sku::parse(&sku_raw).map_err(|e| AppError::validation("sku", e.to_string()))?;

    // Fields are valid; normalize and persist the logo. Everything that can
    // fail from here on must clean that file up.
    let logo = state.images().store(form.file.unwrap_or_default()).await?;

    let new = NewProduct {
        name,
        sku,
        description,
        category,
        logo: Some(logo.clone()),
        source: ProductSource::from(current.role),
        assigned_to: assigned_to.unwrap_or_else(|| vec![current.id]),
    };

    if let Err(e) = ProductRepository::new(state.pool()).create(&new).await {
        remove_dangling_upload(&state, &logo).await;
        return Err(e.into());
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Product created successfully")),
    ))
}

/// List products with filtering, sorting, and pagination.
///
/// Non-admin callers are always restricted to products assigned to them;
/// the restriction is part of the repository filter, so no combination of
/// request parameters can widen it. `total` counts all matches independent
/// of the page window; no (or zero) limit returns everything.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>> {
    let sort = match non_empty(query.sort) {
        None => ProductSortKey::default(),
        Some(s) => ProductSortKey::parse(&s)
            .ok_or_else(|| AppError::validation("sort", "Cannot sort by this field"))?,
    };
    let order = query
        .order
        .as_deref()
        .map(SortOrder::parse)
        .unwrap_or_default();
    let source = match non_empty(query.source) {
        None => None,
        Some(s) => Some(s.parse::<ProductSource>().map_err(|_| {
            AppError::validation("source", "Source must be either 'ADMIN' or 'USER'")
        })?),
    };

    let filter = ProductFilter {
        search: non_empty(query.search),
        category: non_empty(query.category),
        source,
        assigned_to: (!current.role.is_admin()).then_some(current.id),
    };
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.filter(|l| *l > 0);

    let repo = ProductRepository::new(state.pool());
    let products = repo.list(&filter, sort, order, page, limit).await?;
    let total = repo.count(&filter).await?;

    Ok(Json(ProductListResponse { products, total }))
}

/// The distinct set of category values across all products.
pub async fn categories(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
) -> Result<Json<CategoriesResponse>> {
    let categories = ProductRepository::new(state.pool()).categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// Fetch a product by id.
///
/// Whether non-admins can fetch products outside their assignment is a
/// deployment policy; under `assigned-only` the response is 404 so the
/// policy does not reveal which ids exist.
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(ProductId::new(id))
        .await?
        .ok_or(AppError::NotFound("Product not found"))?;

    if state.config().product_read_policy == ProductReadPolicy::AssignedOnly
        && !current.role.is_admin()
        && !product.assigned_to.contains(&current.id)
    {
        return Err(AppError::NotFound("Product not found"));
    }

    Ok(Json(product))
}

/// Partially update a product; only supplied fields overwrite. A new logo
/// replaces (and removes) the previous file.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>> {
    let id = ProductId::new(id);
    let repo = ProductRepository::new(state.pool());
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Product not found"))?;

    let mut form = read_upload_form(&mut multipart, "logo").await?;

    let mut errors = Vec::new();
    let name = form.fields.remove("name").map(|s| s.trim().to_owned());
    if let Some(n) = &name
        && n.is_empty()
    {
        errors.push(FieldError::new("name", "Product name is required"));
    }
    let sku = match form.fields.remove("sku") {
        None => None,
        Some(raw) => match Sku::parse(&raw) {
            Ok(sku) => Some(sku),
            Err(e) => {
                errors.push(FieldError::new("sku", e.to_string()));
                None
            }
        },
    };
    let category = form.fields.remove("category").map(|s| s.trim().to_owned());
    if let Some(c) = &category
        && c.is_empty()
    {
        errors.push(FieldError::new("category", "Category is required"));
    }
    let description = non_empty(form.fields.remove("description"));
    let assigned_to = parse_assigned_to(form.fields.remove("assignedTo"), &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    // Replace the logo only when a new file was actually uploaded.
    let new_logo = match form.file {
        Some(payload) => Some(state.images().replace(existing.logo.as_deref(), payload).await?),
        None => None,
    };

    let changes = ProductChanges {
        name: name.filter(|n| !n.is_empty()),
        sku,
        description,
        category: category.filter(|c| !c.is_empty()),
        logo: new_logo.clone(),
        assigned_to,
    };

    match repo.update(id, &changes).await {
        Ok(Some(_)) => Ok(Json(MessageResponse::new("Product updated successfully"))),
        Ok(None) => {
            if let Some(logo) = &new_logo {
                remove_dangling_upload(&state, logo).await;
            }
            Err(AppError::NotFound("Product not found"))
        }
        Err(e) => {
            if let Some(logo) = &new_logo {
                remove_dangling_upload(&state, logo).await;
            }
            Err(e.into())
        }
    }
}

/// Delete a product and its logo file.
///
/// File removal is tolerant: an already-missing file never blocks deletion
/// of the record.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>> {
    let id = ProductId::new(id);
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Product not found"))?;

    if let Some(logo) = &product.logo
        && let Err(err) = state.images().delete(logo).await
    {
        tracing::warn!(file = %logo, error = %err, "failed to remove product logo");
    }

    if !repo.delete(id).await? {
        return Err(AppError::NotFound("Product not found"));
    }

    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

/// Replace a product's ownership list. Admin only.
pub async fn assign(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<AssignRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let product_id = ProductId::new(req.product_id);
    let user_id = UserId::new(req.user_id);

    let repo = ProductRepository::new(state.pool());
    if repo.get_by_id(product_id).await?.is_none() {
        return Err(AppError::NotFound("Product not found"));
    }
    if !UserRepository::new(state.pool()).exists(user_id).await? {
        return Err(AppError::NotFound("User not found"));
    }

    let assigned: Vec<UserId> = req.assigned_to.into_iter().map(UserId::new).collect();
    if !repo.set_assigned(product_id, &assigned).await? {
        return Err(AppError::NotFound("Product not found"));
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Product assigned successfully")),
    ))
}

/// Parse the `assignedTo` form field: a JSON array of user ids.
fn parse_assigned_to(
    raw: Option<String>,
    errors: &mut Vec<FieldError>,
) -> Option<Vec<UserId>> {
    let raw = non_empty(raw)?;
    match serde_json::from_str::<Vec<i32>>(&raw) {
        Ok(ids) => Some(ids.into_iter().map(UserId::new).collect()),
        Err(_) => {
            errors.push(FieldError::new(
                "assignedTo",
                "assignedTo must be a JSON array of user ids",
            ));
            None
        }
    }
}
