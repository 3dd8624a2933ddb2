//! Product repository for database operations.
//!
//! List queries are assembled with `QueryBuilder`; every caller-supplied
//! value goes through a bind parameter, and sort columns come from a closed
//! whitelist. Ownership visibility is part of the filter itself, so a
//! restricted caller cannot widen it with request parameters.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use catalog_core::{ProductId, ProductSource, Sku, UserId};

use super::{RepositoryError, SortOrder, map_unique_violation};
use crate::models::{NewProduct, Product, ProductChanges};

const PRODUCT_COLUMNS: &str =
    "id, name, sku, description, category, logo, source, assigned_to, created_at, updated_at";

const SKU_CONFLICT: &str = "SKU already exists";

/// Sortable columns for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSortKey {
    Id,
    #[default]
    Name,
    Sku,
    Category,
    Source,
    CreatedAt,
}

impl ProductSortKey {
    /// Parse a query-string sort field. Returns `None` for unknown fields.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "sku" => Some(Self::Sku),
            "category" => Some(Self::Category),
            "source" => Some(Self::Source),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Sku => "sku",
            Self::Category => "category",
            Self::Source => "source",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Filters for product listings.
///
/// `assigned_to` is the visibility restriction: when set, only products
/// whose ownership list contains that user match, whatever else the filter
/// says.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring match over name and SKU.
    pub search: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Exact source match.
    pub source: Option<ProductSource>,
    /// Restrict to products assigned to this user.
    pub assigned_to: Option<UserId>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    sku: String,
    description: Option<String>,
    category: String,
    logo: Option<String>,
    source: String,
    assigned_to: Vec<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, RepositoryError> {
        let sku = Sku::parse(&self.sku).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid SKU in database: {e}"))
        })?;
        let source = self.source.parse::<ProductSource>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid source in database: {e}"))
        })?;

        Ok(Product {
            id: self.id,
            name: self.name,
            sku,
            description: self.description,
            category: self.category,
            logo: self.logo,
            source,
            assigned_to: self.assigned_to.into_iter().map(UserId::new).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Append the filter's WHERE conditions; every value is a bind parameter.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(source) = filter.source {
        qb.push(" AND source = ").push_bind(source.as_str());
    }
    if let Some(user) = filter.assigned_to {
        qb.push(" AND ")
            .push_bind(user.as_i32())
            .push(" = ANY(assigned_to)");
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new product.
    ///
    /// The insert is atomic: a concurrent create with the same SKU loses at
    /// the unique constraint, not at a pre-check.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU is already taken,
    /// `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let assigned: Vec<i32> = new.assigned_to.iter().map(UserId::as_i32).collect();
        let sql = format!(
            "INSERT INTO products (name, sku, description, category, logo, source, assigned_to)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row: ProductRow = sqlx::query_as(&sql)
            .bind(&new.name)
            .bind(new.sku.as_str())
            .bind(&new.description)
            .bind(&new.category)
            .bind(&new.logo)
            .bind(new.source.as_str())
            .bind(&assigned)
            .fetch_one(self.pool)
            .await
            .map_err(|e| map_unique_violation(e, SKU_CONFLICT))?;

        row.into_product()
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(ProductRow::into_product).transpose()
    }

    /// List products matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSortKey,
        order: SortOrder,
        page: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ").push(sort.column()).push(" ").push(order.as_sql());
        if let Some(limit) = limit {
            let offset = (page.max(1) - 1) * limit;
            qb.push(" LIMIT ")
                .push_bind(limit)
                .push(" OFFSET ")
                .push_bind(offset);
        }

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(self.pool).await?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// Count products matching the filter, independent of pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &ProductFilter) -> Result<i64, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM products WHERE 1=1");
        push_filters(&mut qb, filter);

        let total: i64 = qb.build_query_scalar().fetch_one(self.pool).await?;
        Ok(total)
    }

    /// Partially update a product: supplied fields overwrite, everything
    /// else is retained. `source` is immutable and never part of an update.
    ///
    /// Returns `None` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a new SKU is already taken,
    /// `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let assigned: Option<Vec<i32>> = changes
            .assigned_to
            .as_ref()
            .map(|ids| ids.iter().map(UserId::as_i32).collect());
        let sql = format!(
            "UPDATE products SET
                 name = COALESCE($2, name),
                 sku = COALESCE($3, sku),
                 description = COALESCE($4, description),
                 category = COALESCE($5, category),
                 logo = COALESCE($6, logo),
                 assigned_to = COALESCE($7, assigned_to),
                 updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(changes.sku.as_ref().map(Sku::as_str))
            .bind(&changes.description)
            .bind(&changes.category)
            .bind(&changes.logo)
            .bind(&assigned)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| map_unique_violation(e, SKU_CONFLICT))?;

        row.map(ProductRow::into_product).transpose()
    }

    /// Delete a product record.
    ///
    /// Returns `false` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace a product's ownership list (replace semantics, never union).
    ///
    /// Returns `false` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_assigned(
        &self,
        id: ProductId,
        assigned_to: &[UserId],
    ) -> Result<bool, RepositoryError> {
        let assigned: Vec<i32> = assigned_to.iter().map(UserId::as_i32).collect();
        let result = sqlx::query(
            "UPDATE products SET assigned_to = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(&assigned)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The distinct set of category values across all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM products ORDER BY category")
                .fetch_all(self.pool)
                .await?;
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(ProductSortKey::parse("sku"), Some(ProductSortKey::Sku));
        assert_eq!(
            ProductSortKey::parse("created_at"),
            Some(ProductSortKey::CreatedAt)
        );
        assert_eq!(ProductSortKey::parse("logo"), None);
        assert_eq!(ProductSortKey::parse("name; DROP TABLE products"), None);
    }

    #[test]
    fn test_filter_sql_shape() {
        let filter = ProductFilter {
            search: Some("wid".to_owned()),
            category: Some("Hardware".to_owned()),
            source: Some(ProductSource::User),
            assigned_to: Some(UserId::new(7)),
        };

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT 1 WHERE 1=1");
        push_filters(&mut qb, &filter);
        let sql = qb.sql();

        // Values must appear as bind parameters, never inline.
        assert!(!sql.contains("wid"));
        assert!(!sql.contains("Hardware"));
        assert!(sql.contains("ILIKE"));
        assert!(sql.contains("= ANY(assigned_to)"));
    }

    #[test]
    fn test_empty_filter_adds_no_conditions() {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT 1 WHERE 1=1");
        push_filters(&mut qb, &ProductFilter::default());
        assert_eq!(qb.sql(), "SELECT 1 WHERE 1=1");
    }

    #[test]
    fn test_row_conversion_rejects_bad_source() {
        let row = ProductRow {
            id: ProductId::new(1),
            name: "Widget".to_owned(),
            sku: "WID-001".to_owned(),
            description: None,
            category: "Hardware".to_owned(),
            logo: None,
            source: "IMPORTED".to_owned(),
            assigned_to: vec![1, 2],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            row.into_product(),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
