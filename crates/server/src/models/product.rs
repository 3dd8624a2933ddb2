//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use catalog_core::{ProductId, ProductSource, Sku, UserId};

/// A catalog product (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Stock keeping unit (unique across the catalog).
    pub sku: Sku,
    /// Free-form description.
    pub description: Option<String>,
    /// Category label.
    pub category: String,
    /// Stored file name of the logo image, if one was uploaded.
    ///
    /// The reference may point at a file that no longer exists (e.g. after
    /// a crash between file and record writes); readers treat that as
    /// "logo absent".
    pub logo: Option<String>,
    /// Who created the product; immutable after creation.
    pub source: ProductSource,
    /// Identities with non-admin visibility of this product.
    pub assigned_to: Vec<UserId>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sku: Sku,
    pub description: Option<String>,
    pub category: String,
    pub logo: Option<String>,
    pub source: ProductSource,
    pub assigned_to: Vec<UserId>,
}

/// Partial update of a product; `None` fields keep their current values.
///
/// `source` is deliberately absent: it is set at creation and immutable.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub sku: Option<Sku>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub logo: Option<String>,
    pub assigned_to: Option<Vec<UserId>>,
}

impl ProductChanges {
    /// Whether this update would change anything at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.logo.is_none()
            && self.assigned_to.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_shape() {
        let product = Product {
            id: ProductId::new(9),
            name: "Widget".to_owned(),
            sku: Sku::parse("WID-001").expect("valid sku"),
            description: None,
            category: "Hardware".to_owned(),
            logo: Some("logo-1700000000000.jpg".to_owned()),
            source: ProductSource::Admin,
            assigned_to: vec![UserId::new(1), UserId::new(2)],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&product).expect("serialize");
        assert_eq!(value["sku"], "WID-001");
        assert_eq!(value["source"], "ADMIN");
        assert_eq!(value["assignedTo"], serde_json::json!([1, 2]));
        assert!(value["description"].is_null());
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(ProductChanges::default().is_empty());
        let changes = ProductChanges {
            name: Some("New".to_owned()),
            ..ProductChanges::default()
        };
        assert!(!changes.is_empty());
    }
}
