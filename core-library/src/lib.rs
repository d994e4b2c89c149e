//! # Subtitle Artifact Store
//!
//! Owns the SQLite database that backs the subtitle cache and provides the
//! repository consumed by the cache layer.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite connection pooling and embedded migrations
//! - The `CachedArtifact` entity
//! - The `ArtifactDao` contract and its SQLite implementation

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig, StoreLocation};
pub use error::{LibraryError, Result};
pub use models::{CacheStats, CachedArtifact};
pub use repositories::{ArtifactDao, SqliteArtifactDao};
