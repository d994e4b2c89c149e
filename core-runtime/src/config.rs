//! # Core Configuration Module
//!
//! Provides configuration management for the subtitle core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all host bridges and tunables the core needs. It
//! enforces fail-fast validation so a missing bridge is reported before any
//! component is constructed.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - Transport for every subtitle provider
//! - `SettingsStore` - Subtitle preferences (cache policy, language, style)
//!
//! When the `desktop-shims` feature is enabled, `ReqwestHttpClient` and
//! `SqliteSettingsStore` are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/subtitles.db")
//!     .request_timeout(Duration::from_secs(10))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Without `desktop-shims`, omitting a required bridge fails with
//! [`Error::CapabilityMissing`] naming the bridge and how to provide it.

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, SettingsStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout attached to every provider HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default upper bound for a single source's search during fan-out.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(20);

/// Default `User-Agent` sent to subtitle providers.
pub const DEFAULT_USER_AGENT: &str = concat!("subtitle-core/", env!("CARGO_PKG_VERSION"));

/// Base URLs of the remote subtitle providers.
///
/// Overridable so hosts can point at mirrors and tests at local fakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    /// Free-text search provider
    pub opensubtitles: String,
    /// IMDb-id keyed provider
    pub yify: String,
    /// Aggregated JSON provider
    pub podnapisi: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            opensubtitles: "https://api.opensubtitles.com/api/v1".to_string(),
            yify: "https://yts-subs.com/api".to_string(),
            podnapisi: "https://www.podnapisi.net".to_string(),
        }
    }
}

impl ProviderEndpoints {
    pub fn with_opensubtitles(mut self, base: impl Into<String>) -> Self {
        self.opensubtitles = base.into();
        self
    }

    pub fn with_yify(mut self, base: impl Into<String>) -> Self {
        self.yify = base.into();
        self
    }

    pub fn with_podnapisi(mut self, base: impl Into<String>) -> Self {
        self.podnapisi = base.into();
        self
    }

    /// Every endpoint must be an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("opensubtitles", &self.opensubtitles),
            ("yify", &self.yify),
            ("podnapisi", &self.podnapisi),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "Endpoint for {} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }
        Ok(())
    }
}

/// Core configuration for the subtitle core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// SQLite file backing the artifact cache; `None` keeps it in memory
    pub database_path: Option<PathBuf>,

    /// HTTP transport shared by all providers
    pub http_client: Arc<dyn HttpClient>,

    /// Preferences storage
    pub settings_store: Arc<dyn SettingsStore>,

    /// Time source for cache expiry and eviction
    pub clock: Arc<dyn Clock>,

    /// Provider base URLs
    pub endpoints: ProviderEndpoints,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Per-source bound during aggregate search
    pub source_timeout: Duration,

    /// `User-Agent` header for provider requests
    pub user_agent: String,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("clock", &"Clock { ... }")
            .field("endpoints", &self.endpoints)
            .field("request_timeout", &self.request_timeout)
            .field("source_timeout", &self.source_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path, when set, is not empty
    /// - Timeouts are non-zero and a request fits inside its source budget
    /// - User agent is not blank
    /// - Endpoints are http(s) URLs
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.source_timeout.is_zero() {
            return Err(Error::Config(
                "Source timeout must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout > self.source_timeout {
            return Err(Error::Config(format!(
                "Request timeout ({:?}) exceeds the per-source timeout ({:?})",
                self.request_timeout, self.source_timeout
            )));
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("User agent cannot be empty".to_string()));
        }

        self.endpoints.validate()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for subtitle providers. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Mobile: inject the platform HTTP stack (URLSession/OkHttp)."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for subtitle preferences. \
                 Desktop: enable the 'desktop-shims' feature to use the default SqliteSettingsStore. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(request_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::with_timeout(request_timeout));
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_request_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(
    database_path: Option<&std::path::Path>,
) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let candidate = database_path.map(|path| {
        path.parent()
            .map(|parent| parent.join("settings.db"))
            .unwrap_or_else(|| PathBuf::from("settings.db"))
    });

    let init_store = move || -> Result<SqliteSettingsStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default settings store: {}",
                    e
                ))
            })?;

        runtime
            .block_on(async move {
                match candidate {
                    Some(path) => SqliteSettingsStore::new(path).await,
                    None => SqliteSettingsStore::in_memory().await,
                }
            })
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // A runtime cannot be blocked on from inside another one
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(init_store).join().map_err(|_| {
            Error::Internal(
                "Worker thread panicked while creating default SettingsStore".to_string(),
            )
        })??,
        Err(_) => init_store()?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(
    _database_path: Option<&std::path::Path>,
) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    clock: Option<Arc<dyn Clock>>,
    endpoints: Option<ProviderEndpoints>,
    request_timeout: Option<Duration>,
    source_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl CoreConfigBuilder {
    /// Sets the SQLite file for the artifact cache.
    ///
    /// When unset the cache lives in memory for the lifetime of the process.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder().database_path("/path/to/subtitles.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store implementation.
    ///
    /// If not provided, the desktop default (SQLite file next to the database,
    /// or in memory) is used when the `desktop-shims` feature is enabled.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the time source. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the provider base URLs.
    pub fn endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Sets the per-request HTTP timeout. Default: 15 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the per-source search bound. Default: 20 seconds.
    pub fn source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` header for provider requests.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] if a required bridge is missing and no
    ///   desktop default is available
    /// - [`Error::Config`] if any value is invalid
    pub fn build(self) -> Result<CoreConfig> {
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.database_path.as_deref())?,
        };

        let config = CoreConfig {
            database_path: self.database_path,
            http_client,
            settings_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            endpoints: self.endpoints.unwrap_or_default(),
            request_timeout,
            source_timeout: self.source_timeout.unwrap_or(DEFAULT_SOURCE_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse};

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, BridgeError> {
            Ok(HttpResponse::new(200, "[]"))
        }
    }

    struct MockSettingsStore;

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(
            &self,
            _key: &str,
            _value: &str,
        ) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> std::result::Result<Option<String>, BridgeError> {
            Ok(None)
        }

        async fn set_bool(&self, _key: &str, _value: bool) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_bool(&self, _key: &str) -> std::result::Result<Option<bool>, BridgeError> {
            Ok(None)
        }

        async fn set_i64(&self, _key: &str, _value: i64) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_i64(&self, _key: &str) -> std::result::Result<Option<i64>, BridgeError> {
            Ok(None)
        }

        async fn set_f64(&self, _key: &str, _value: f64) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_f64(&self, _key: &str) -> std::result::Result<Option<f64>, BridgeError> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn has_key(&self, _key: &str) -> std::result::Result<bool, BridgeError> {
            Ok(false)
        }

        async fn list_keys(&self) -> std::result::Result<Vec<String>, BridgeError> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> std::result::Result<(), BridgeError> {
            Ok(())
        }
    }

    fn builder_with_bridges() -> CoreConfigBuilder {
        CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .settings_store(Arc::new(MockSettingsStore))
    }

    #[test]
    fn test_build_with_defaults() {
        let config = builder_with_bridges().build().unwrap();

        assert!(config.database_path.is_none());
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.source_timeout, DEFAULT_SOURCE_TIMEOUT);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.endpoints, ProviderEndpoints::default());
    }

    #[test]
    fn test_build_with_overrides() {
        let endpoints = ProviderEndpoints::default()
            .with_opensubtitles("http://127.0.0.1:8080/os")
            .with_yify("http://127.0.0.1:8080/yify")
            .with_podnapisi("http://127.0.0.1:8080/pod");

        let config = builder_with_bridges()
            .database_path("/tmp/subtitles.db")
            .endpoints(endpoints.clone())
            .request_timeout(Duration::from_secs(5))
            .source_timeout(Duration::from_secs(8))
            .user_agent("TestPlayer/2.0")
            .build()
            .unwrap();

        assert_eq!(
            config.database_path,
            Some(PathBuf::from("/tmp/subtitles.db"))
        );
        assert_eq!(config.endpoints, endpoints);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.source_timeout, Duration::from_secs(8));
        assert_eq!(config.user_agent, "TestPlayer/2.0");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = builder_with_bridges()
            .request_timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_request_timeout_must_fit_source_timeout() {
        let result = builder_with_bridges()
            .request_timeout(Duration::from_secs(30))
            .source_timeout(Duration::from_secs(10))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_blank_user_agent_rejected() {
        let result = builder_with_bridges().user_agent("   ").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = builder_with_bridges()
            .endpoints(ProviderEndpoints::default().with_yify("ftp://mirror"))
            .build();

        match result {
            Err(Error::Config(message)) => assert!(message.contains("yify")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = builder_with_bridges().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("HttpClient { ... }"));
        assert!(debug.contains("request_timeout"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_fails_fast() {
        let result = CoreConfig::builder()
            .settings_store(Arc::new(MockSettingsStore))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "HttpClient")
            }
            other => panic!("expected capability error, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_settings_store_fails_fast() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "SettingsStore")
            }
            other => panic!("expected capability error, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_injected() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&base).unwrap();

        let config = CoreConfig::builder()
            .database_path(base.join("subtitles.db"))
            .build()
            .unwrap();

        assert!(config.database_path.is_some());
        assert!(base.join("settings.db").exists());

        let _ = std::fs::remove_dir_all(&base);
    }

    #[cfg(feature = "desktop-shims")]
    #[tokio::test(flavor = "multi_thread")]
    async fn test_desktop_defaults_inside_runtime() {
        let config = CoreConfig::builder().build().unwrap();
        assert!(config.database_path.is_none());
    }
}
