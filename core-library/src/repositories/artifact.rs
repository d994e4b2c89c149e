//! Database repository for cached subtitle artifacts
//!
//! Schema is managed via `migrations/001_create_subtitle_artifacts.sql`.

use crate::error::{LibraryError, Result};
use crate::models::CachedArtifact;
use sqlx::SqlitePool;
use tracing::{debug, error, instrument};

/// Data-access contract consumed by the subtitle cache repository.
///
/// All timestamps are Unix milliseconds.
#[async_trait::async_trait]
pub trait ArtifactDao: Send + Sync {
    /// Find an artifact by its key.
    async fn get_by_key(&self, key: &str) -> Result<Option<CachedArtifact>>;

    /// Insert an artifact, replacing any record with the same key.
    async fn insert_or_replace(&self, artifact: &CachedArtifact) -> Result<()>;

    /// Record a read: `last_accessed_at` never moves backwards and
    /// `access_count` is incremented.
    async fn update_access_metadata(&self, key: &str, timestamp: i64) -> Result<()>;

    /// Delete an artifact. Returns `true` if a record was removed.
    async fn delete_by_key(&self, key: &str) -> Result<bool>;

    /// Delete every artifact generated before `timestamp`.
    async fn delete_older_than(&self, timestamp: i64) -> Result<u64>;

    /// Number of live records.
    async fn count(&self) -> Result<i64>;

    /// Whether a record exists for `key`.
    async fn exists_by_key(&self, key: &str) -> Result<bool>;

    /// Delete the `limit` least-recently-accessed records.
    async fn delete_least_recently_accessed(&self, limit: i64) -> Result<u64>;

    /// Delete every record.
    async fn delete_all(&self) -> Result<u64>;

    /// Sum of payload sizes in bytes.
    async fn total_payload_bytes(&self) -> Result<i64>;
}

/// SQLite implementation of [`ArtifactDao`].
pub struct SqliteArtifactDao {
    pool: SqlitePool,
}

impl SqliteArtifactDao {
    /// Create a new repository over a migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn cache_error(action: &str, e: sqlx::Error) -> LibraryError {
    error!("Failed to {}: {}", action, e);
    LibraryError::CacheError(format!("Failed to {}: {}", action, e))
}

#[async_trait::async_trait]
impl ArtifactDao for SqliteArtifactDao {
    #[instrument(skip(self))]
    async fn get_by_key(&self, key: &str) -> Result<Option<CachedArtifact>> {
        sqlx::query_as::<_, CachedArtifact>(
            "SELECT key, payload, generated_at, last_accessed_at, access_count
             FROM subtitle_artifacts WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| cache_error("query artifact", e))
    }

    #[instrument(skip(self, artifact), fields(key = %artifact.key, bytes = artifact.payload.len()))]
    async fn insert_or_replace(&self, artifact: &CachedArtifact) -> Result<()> {
        artifact
            .validate()
            .map_err(|message| LibraryError::invalid("artifact", message))?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO subtitle_artifacts (
                key, payload, generated_at, last_accessed_at, access_count
            ) VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&artifact.key)
        .bind(&artifact.payload)
        .bind(artifact.generated_at)
        .bind(artifact.last_accessed_at)
        .bind(artifact.access_count)
        .execute(&self.pool)
        .await
        .map_err(|e| cache_error("insert artifact", e))?;

        debug!("Stored artifact");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_access_metadata(&self, key: &str, timestamp: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE subtitle_artifacts SET
                last_accessed_at = MAX(last_accessed_at, ?),
                access_count = access_count + 1
            WHERE key = ?
            "#,
        )
        .bind(timestamp)
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| cache_error("update access metadata", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_key(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subtitle_artifacts WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| cache_error("delete artifact", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_older_than(&self, timestamp: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM subtitle_artifacts WHERE generated_at < ?")
            .bind(timestamp)
            .execute(&self.pool)
            .await
            .map_err(|e| cache_error("delete expired artifacts", e))?;

        debug!(deleted = result.rows_affected(), "Deleted expired artifacts");
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subtitle_artifacts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| cache_error("count artifacts", e))?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn exists_by_key(&self, key: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM subtitle_artifacts WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| cache_error("check artifact", e))?;

        Ok(row.is_some())
    }

    #[instrument(skip(self))]
    async fn delete_least_recently_accessed(&self, limit: i64) -> Result<u64> {
        if limit <= 0 {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            DELETE FROM subtitle_artifacts WHERE key IN (
                SELECT key FROM subtitle_artifacts
                ORDER BY last_accessed_at ASC, generated_at ASC
                LIMIT ?
            )
            "#,
        )
        .bind(limit)
        .execute(&self.pool)
        .await
        .map_err(|e| cache_error("evict artifacts", e))?;

        debug!(evicted = result.rows_affected(), "Evicted artifacts");
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM subtitle_artifacts")
            .execute(&self.pool)
            .await
            .map_err(|e| cache_error("clear artifacts", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn total_payload_bytes(&self) -> Result<i64> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(LENGTH(payload)), 0) FROM subtitle_artifacts")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| cache_error("sum payload sizes", e))?;

        Ok(total)
    }
}
