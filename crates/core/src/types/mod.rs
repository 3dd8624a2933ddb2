//! Core types for Partner Catalog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod role;
pub mod sku;
pub mod source;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::{Role, RoleError};
pub use sku::{Sku, SkuError};
pub use source::{ProductSource, ProductSourceError};
