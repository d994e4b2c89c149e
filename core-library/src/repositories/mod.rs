//! # Repository Pattern Implementation
//!
//! Repository traits and their SQLite implementations.
//!
//! - Traits define the interface consumed by feature crates
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling

pub mod artifact;

pub use artifact::{ArtifactDao, SqliteArtifactDao};
