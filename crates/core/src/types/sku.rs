//! Stock keeping unit (SKU) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Sku`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SkuError {
    /// The input string is empty.
    #[error("SKU is required")]
    Empty,
    /// The input string is shorter than the minimum length.
    #[error("SKU must be at least {} characters long", Sku::MIN_LENGTH)]
    TooShort,
    /// The input string exceeds the maximum length.
    #[error("SKU must be at most {} characters long", Sku::MAX_LENGTH)]
    TooLong,
}

/// A product's stock keeping unit.
///
/// SKUs are caller-supplied opaque identifiers; the only structural rules
/// are the length bounds. Uniqueness across the catalog is enforced by the
/// persistence layer, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Minimum SKU length.
    pub const MIN_LENGTH: usize = 3;
    /// Maximum SKU length.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `Sku` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`SkuError`] if the input is empty or outside the length
    /// bounds.
    pub fn parse(s: &str) -> Result<Self, SkuError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SkuError::Empty);
        }
        if trimmed.len() < Self::MIN_LENGTH {
            return Err(SkuError::TooShort);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(SkuError::TooLong);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the SKU as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Sku` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Sku {
    type Err = SkuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Sku::parse("ABC").is_ok());
        assert!(Sku::parse("SKU-2024-001").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Sku::parse(""), Err(SkuError::Empty));
        assert_eq!(Sku::parse("   "), Err(SkuError::Empty));
    }

    #[test]
    fn test_parse_too_short() {
        assert_eq!(Sku::parse("AB"), Err(SkuError::TooShort));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "X".repeat(65);
        assert_eq!(Sku::parse(&long), Err(SkuError::TooLong));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let sku = Sku::parse("  ABC-1  ").expect("valid sku");
        assert_eq!(sku.as_str(), "ABC-1");
    }
}
