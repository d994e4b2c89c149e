//! Shared subtitle subsystem state.
//!
//! A host builds one [`SubtitleContext`] at startup and hands the `Arc` to
//! whatever needs it. Construction applies database migrations, so doing it
//! twice against the same file is harmless but wasteful.

use std::sync::Arc;

use core_library::{create_pool, DatabaseConfig, SqliteArtifactDao};
use core_runtime::config::CoreConfig;
use core_runtime::logging::strip_path;
use core_subtitles::{
    SettingsSubtitlePreferences, SubtitleAggregator, SubtitleCacheRepository, SubtitlePreferences,
};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{CoreError, Result};

pub struct SubtitleContext {
    config: CoreConfig,
    pool: SqlitePool,
    preferences: Arc<dyn SubtitlePreferences>,
    cache: Arc<SubtitleCacheRepository>,
    aggregator: Arc<SubtitleAggregator>,
}

impl SubtitleContext {
    /// Open the artifact database and wire the subsystem together.
    ///
    /// # Errors
    ///
    /// Fails with the config's own error if it is invalid, or
    /// [`CoreError::InitializationFailed`] if the database cannot be opened or
    /// migrated.
    pub async fn initialize(config: CoreConfig) -> Result<Arc<Self>> {
        config.validate()?;

        let store = config
            .database_path
            .as_ref()
            .map(|path| strip_path(&path.to_string_lossy()).to_string())
            .unwrap_or_else(|| ":memory:".to_string());
        let db_config = match &config.database_path {
            Some(path) => DatabaseConfig::new(path),
            None => DatabaseConfig::in_memory(),
        };
        let pool = create_pool(db_config).await.map_err(|e| {
            CoreError::InitializationFailed(format!("artifact store {}: {}", store, e))
        })?;

        let dao = Arc::new(SqliteArtifactDao::new(pool.clone()));
        let preferences: Arc<dyn SubtitlePreferences> = Arc::new(
            SettingsSubtitlePreferences::new(config.settings_store.clone()),
        );
        let cache = Arc::new(SubtitleCacheRepository::new(
            dao,
            preferences.clone(),
            config.clock.clone(),
        ));
        let aggregator = Arc::new(SubtitleAggregator::from_config(&config));

        info!(
            database = %store,
            sources = ?aggregator.sources(),
            "Subtitle context initialized"
        );

        Ok(Arc::new(Self {
            config,
            pool,
            preferences,
            cache,
            aggregator,
        }))
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn preferences(&self) -> &Arc<dyn SubtitlePreferences> {
        &self.preferences
    }

    pub fn cache(&self) -> &Arc<SubtitleCacheRepository> {
        &self.cache
    }

    pub fn aggregator(&self) -> &Arc<SubtitleAggregator> {
        &self.aggregator
    }

    /// Close the database pool. Further cache operations degrade to misses.
    pub async fn shutdown(&self) {
        self.pool.close().await;
        info!("Subtitle context shut down");
    }
}
