//! Subtitle preferences
//!
//! Persisted through the host [`SettingsStore`] under the `subtitles.` key
//! prefix. Values are read on every call, so a change made elsewhere is seen
//! immediately. Missing keys and store failures fall back to defaults.

use async_trait::async_trait;
use bridge_traits::settings::SettingsStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::language;

pub const KEY_ENABLE_CACHE: &str = "subtitles.enable_cache";
pub const KEY_CACHE_EXPIRY_DAYS: &str = "subtitles.cache_expiry_days";
pub const KEY_MAX_CACHE_SIZE: &str = "subtitles.max_cache_size";
pub const KEY_PREFERRED_LANGUAGE: &str = "subtitles.preferred_language";
pub const KEY_AUTO_SELECT: &str = "subtitles.auto_select";
pub const KEY_STYLE: &str = "subtitles.style";
pub const KEY_GENERATION_COUNT: &str = "subtitles.generation_count";
pub const KEY_LAST_GENERATED: &str = "subtitles.last_generated_key";

pub const DEFAULT_ENABLE_CACHE: bool = true;
pub const DEFAULT_CACHE_EXPIRY_DAYS: u32 = 7;
pub const DEFAULT_MAX_CACHE_SIZE: u32 = 100;
pub const DEFAULT_PREFERRED_LANGUAGE: &str = "en";
pub const DEFAULT_AUTO_SELECT: bool = true;

/// Vertical placement of rendered captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtitlePosition {
    #[default]
    Bottom,
    Top,
}

/// Caption rendering style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    /// Multiplier on the player's base font size
    pub font_scale: f32,
    /// `#RRGGBB`
    pub text_color: String,
    /// `#RRGGBB`
    pub background_color: String,
    /// 0.0 (transparent) to 1.0
    pub background_opacity: f32,
    pub position: SubtitlePosition,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_scale: 1.0,
            text_color: "#FFFFFF".to_string(),
            background_color: "#000000".to_string(),
            background_opacity: 0.5,
            position: SubtitlePosition::Bottom,
        }
    }
}

impl SubtitleStyle {
    /// Clamp numeric fields into range; non-finite values take the default.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        self.font_scale = if self.font_scale.is_finite() {
            self.font_scale.clamp(0.25, 4.0)
        } else {
            defaults.font_scale
        };
        self.background_opacity = if self.background_opacity.is_finite() {
            self.background_opacity.clamp(0.0, 1.0)
        } else {
            defaults.background_opacity
        };
        self
    }
}

/// User-facing subtitle settings and cache policy knobs.
#[async_trait]
pub trait SubtitlePreferences: Send + Sync {
    async fn enable_cache(&self) -> bool;
    async fn set_enable_cache(&self, enabled: bool) -> Result<()>;

    async fn cache_expiry_days(&self) -> u32;
    async fn set_cache_expiry_days(&self, days: u32) -> Result<()>;

    async fn max_cache_size(&self) -> u32;
    async fn set_max_cache_size(&self, max: u32) -> Result<()>;

    /// Normalized language code searched by default.
    async fn preferred_language(&self) -> String;
    async fn set_preferred_language(&self, language: &str) -> Result<()>;

    /// Pick a track automatically after an automatic search.
    async fn auto_select(&self) -> bool;
    async fn set_auto_select(&self, enabled: bool) -> Result<()>;

    async fn style(&self) -> SubtitleStyle;
    async fn set_style(&self, style: &SubtitleStyle) -> Result<()>;

    /// Note that a parsed result was stored under `key`. Best effort.
    async fn record_generation_event(&self, key: &str);
}

/// [`SubtitlePreferences`] backed by the host settings store.
pub struct SettingsSubtitlePreferences {
    store: Arc<dyn SettingsStore>,
}

impl SettingsSubtitlePreferences {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    async fn read_bool(&self, key: &str, default: bool) -> bool {
        match self.store.get_bool(key).await {
            Ok(value) => value.unwrap_or(default),
            Err(e) => {
                warn!(key, error = %e, "Failed to read preference, using default");
                default
            }
        }
    }

    async fn read_u32(&self, key: &str, default: u32) -> u32 {
        match self.store.get_i64(key).await {
            Ok(Some(value)) => u32::try_from(value).unwrap_or_else(|_| {
                warn!(key, value, "Preference out of range, using default");
                default
            }),
            Ok(None) => default,
            Err(e) => {
                warn!(key, error = %e, "Failed to read preference, using default");
                default
            }
        }
    }
}

#[async_trait]
impl SubtitlePreferences for SettingsSubtitlePreferences {
    async fn enable_cache(&self) -> bool {
        self.read_bool(KEY_ENABLE_CACHE, DEFAULT_ENABLE_CACHE).await
    }

    async fn set_enable_cache(&self, enabled: bool) -> Result<()> {
        self.store.set_bool(KEY_ENABLE_CACHE, enabled).await?;
        Ok(())
    }

    async fn cache_expiry_days(&self) -> u32 {
        self.read_u32(KEY_CACHE_EXPIRY_DAYS, DEFAULT_CACHE_EXPIRY_DAYS)
            .await
    }

    async fn set_cache_expiry_days(&self, days: u32) -> Result<()> {
        self.store
            .set_i64(KEY_CACHE_EXPIRY_DAYS, i64::from(days))
            .await?;
        Ok(())
    }

    async fn max_cache_size(&self) -> u32 {
        self.read_u32(KEY_MAX_CACHE_SIZE, DEFAULT_MAX_CACHE_SIZE).await
    }

    async fn set_max_cache_size(&self, max: u32) -> Result<()> {
        self.store.set_i64(KEY_MAX_CACHE_SIZE, i64::from(max)).await?;
        Ok(())
    }

    async fn preferred_language(&self) -> String {
        match self.store.get_string(KEY_PREFERRED_LANGUAGE).await {
            Ok(Some(code)) if !code.trim().is_empty() => language::normalize_code(&code),
            Ok(_) => DEFAULT_PREFERRED_LANGUAGE.to_string(),
            Err(e) => {
                warn!(error = %e, "Failed to read preferred language, using default");
                DEFAULT_PREFERRED_LANGUAGE.to_string()
            }
        }
    }

    async fn set_preferred_language(&self, language: &str) -> Result<()> {
        let code = language::normalize_code(language);
        self.store.set_string(KEY_PREFERRED_LANGUAGE, &code).await?;
        debug!(language = %code, "Preferred subtitle language updated");
        Ok(())
    }

    async fn auto_select(&self) -> bool {
        self.read_bool(KEY_AUTO_SELECT, DEFAULT_AUTO_SELECT).await
    }

    async fn set_auto_select(&self, enabled: bool) -> Result<()> {
        self.store.set_bool(KEY_AUTO_SELECT, enabled).await?;
        Ok(())
    }

    async fn style(&self) -> SubtitleStyle {
        let raw = match self.store.get_string(KEY_STYLE).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return SubtitleStyle::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read subtitle style, using default");
                return SubtitleStyle::default();
            }
        };

        serde_json::from_str::<SubtitleStyle>(&raw)
            .map(SubtitleStyle::normalized)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Stored subtitle style is invalid, using default");
                SubtitleStyle::default()
            })
    }

    async fn set_style(&self, style: &SubtitleStyle) -> Result<()> {
        let json = serde_json::to_string(&style.clone().normalized())?;
        self.store.set_string(KEY_STYLE, &json).await?;
        Ok(())
    }

    async fn record_generation_event(&self, key: &str) {
        let count = match self.store.get_i64(KEY_GENERATION_COUNT).await {
            Ok(value) => value.unwrap_or(0),
            Err(e) => {
                warn!(error = %e, "Failed to read generation count");
                0
            }
        };

        let writes = async {
            self.store
                .set_i64(KEY_GENERATION_COUNT, count.saturating_add(1))
                .await?;
            self.store.set_string(KEY_LAST_GENERATED, key).await
        };

        if let Err(e) = writes.await {
            warn!(key, error = %e, "Failed to record generation event");
        }
    }
}
