use thiserror::Error;

/// Failures of the artifact store.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A record failed validation before reaching the database
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// A query against the artifact table failed
    #[error("Cache error: {0}")]
    CacheError(String),
}

impl LibraryError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
