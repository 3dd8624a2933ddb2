//! Partner Catalog core - shared types library.
//!
//! This crate provides common types used across all Partner Catalog
//! components:
//! - `server` - The HTTP API
//! - `cli` - Command-line tools for migrations and bootstrapping
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, SKUs, and the
//!   role/source enumerations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
