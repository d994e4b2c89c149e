//! Domain models for the subtitle artifact store
//!
//! This module contains the persisted entity shapes with validation and
//! database mapping.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// =============================================================================
// Cached Artifact
// =============================================================================

/// A cached subtitle artifact (downloaded text or parsed cues), keyed by the
/// source URL it was produced from.
///
/// Timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CachedArtifact {
    /// Natural key: the source URL
    pub key: String,
    /// Serialized artifact
    pub payload: Vec<u8>,
    /// When the artifact was generated (first saved or last overwritten)
    pub generated_at: i64,
    /// Most recent read; never moves backwards
    pub last_accessed_at: i64,
    /// Number of reads since generation
    pub access_count: i64,
}

impl CachedArtifact {
    /// Create a freshly generated artifact
    pub fn new(key: impl Into<String>, payload: Vec<u8>, now_millis: i64) -> Self {
        Self {
            key: key.into(),
            payload,
            generated_at: now_millis,
            last_accessed_at: now_millis,
            access_count: 0,
        }
    }

    /// Validate artifact data
    pub fn validate(&self) -> Result<(), String> {
        if self.key.trim().is_empty() {
            return Err("Artifact key cannot be empty".to_string());
        }

        if self.payload.is_empty() {
            return Err("Artifact payload cannot be empty".to_string());
        }

        if self.last_accessed_at < self.generated_at {
            return Err("last_accessed_at cannot precede generated_at".to_string());
        }

        if self.access_count < 0 {
            return Err("access_count cannot be negative".to_string());
        }

        Ok(())
    }

    /// Whether the artifact was generated before `cutoff_millis`
    pub fn is_older_than(&self, cutoff_millis: i64) -> bool {
        self.generated_at < cutoff_millis
    }

    /// Payload size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.payload.len() as u64
    }
}

/// Aggregate numbers about the artifact store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of live records
    pub entry_count: i64,
    /// Sum of payload sizes in bytes
    pub total_bytes: i64,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_artifact_defaults() {
        let artifact = CachedArtifact::new("https://subs.example/a.srt", b"{}".to_vec(), 1_000);

        assert_eq!(artifact.generated_at, 1_000);
        assert_eq!(artifact.last_accessed_at, 1_000);
        assert_eq!(artifact.access_count, 0);
        assert_eq!(artifact.size_bytes(), 2);
        assert!(artifact.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_records() {
        let mut artifact = CachedArtifact::new("  ", b"x".to_vec(), 10);
        assert!(artifact.validate().is_err());

        artifact.key = "k".to_string();
        artifact.payload.clear();
        assert!(artifact.validate().is_err());

        artifact.payload = b"x".to_vec();
        artifact.last_accessed_at = 5;
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_is_older_than() {
        let artifact = CachedArtifact::new("k", b"x".to_vec(), 100);
        assert!(artifact.is_older_than(101));
        assert!(!artifact.is_older_than(100));
    }
}
