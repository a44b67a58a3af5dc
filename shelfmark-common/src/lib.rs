//! # Shelfmark Common Library
//!
//! Shared code for the Shelfmark catalog services:
//! - Catalog data model (`CatalogRecord`, `UploadLogEntry`)
//! - Error types
//! - Configuration loading and root folder resolution

pub mod config;
pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{CatalogRecord, UploadLogEntry};
