//! Host-facing subtitle operations.

use std::sync::Arc;

use core_library::CacheStats;
use core_runtime::config::CoreConfig;
use core_subtitles::language;
use core_subtitles::parser;
use core_subtitles::{ParsedSubtitle, SubtitleQuery, SubtitleStyle, SubtitleTrack};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::context::SubtitleContext;
use crate::error::Result;

/// Search, load and select subtitles for the current video.
///
/// The latest search result and the selected track are published on
/// `watch` channels so UIs can follow them.
pub struct SubtitleService {
    context: Arc<SubtitleContext>,
    available_tracks: watch::Sender<Vec<SubtitleTrack>>,
    current_track: watch::Sender<Option<SubtitleTrack>>,
}

impl SubtitleService {
    pub fn new(context: Arc<SubtitleContext>) -> Self {
        let (available_tracks, _) = watch::channel(Vec::new());
        let (current_track, _) = watch::channel(None);
        Self {
            context,
            available_tracks,
            current_track,
        }
    }

    /// Initialize a fresh [`SubtitleContext`] and wrap it.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        let context = SubtitleContext::initialize(config).await?;
        Ok(Self::new(context))
    }

    pub fn context(&self) -> &Arc<SubtitleContext> {
        &self.context
    }

    // ---------------------------------------------------------------------
    // Search
    // ---------------------------------------------------------------------

    /// Search every remote source and publish the result.
    pub async fn search_subtitles(&self, query: &SubtitleQuery) -> Vec<SubtitleTrack> {
        let tracks = self
            .context
            .aggregator()
            .search_all_sources(query, None)
            .await;
        self.available_tracks.send_replace(tracks.clone());
        tracks
    }

    /// Like [`search_subtitles`](Self::search_subtitles) but abandoned when
    /// `cancel` fires. Nothing is published for a cancelled search.
    pub async fn search_subtitles_cancellable(
        &self,
        query: &SubtitleQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<SubtitleTrack>> {
        let tracks = self
            .context
            .aggregator()
            .search_all_sources_cancellable(query, None, cancel)
            .await?;
        self.available_tracks.send_replace(tracks.clone());
        Ok(tracks)
    }

    /// Search in the preferred language. With auto-select on, the first
    /// default track is selected, else the first track in that language.
    #[instrument(skip(self))]
    pub async fn auto_search_subtitles(
        &self,
        video_name: &str,
        external_id: Option<&str>,
    ) -> Vec<SubtitleTrack> {
        let preferences = self.context.preferences();
        let preferred = preferences.preferred_language().await;

        let mut query = SubtitleQuery::new(video_name, preferred.as_str());
        if let Some(id) = external_id {
            query = query.with_external_id(id);
        }

        let tracks = self.search_subtitles(&query).await;

        if preferences.auto_select().await {
            let pick = tracks
                .iter()
                .find(|track| track.is_default)
                .or_else(|| {
                    tracks
                        .iter()
                        .find(|track| language::same_language(&track.language_code, &preferred))
                })
                .cloned();

            match pick {
                Some(track) => {
                    info!(track = %track.id, "Auto-selected subtitle track");
                    self.select_track(Some(track));
                }
                None => debug!(language = %preferred, "No track to auto-select"),
            }
        }

        tracks
    }

    // ---------------------------------------------------------------------
    // Download & parse
    // ---------------------------------------------------------------------

    pub async fn download_subtitle(&self, track: &SubtitleTrack) -> Option<String> {
        self.context.aggregator().download_subtitle(track).await
    }

    /// Parsed cues for `track`, from cache when possible.
    ///
    /// On a miss the file is downloaded and parsed as its declared format,
    /// falling back to content detection, then cached under `track.url`.
    #[instrument(skip(self, track), fields(track = %track.id))]
    pub async fn load_subtitle(&self, track: &SubtitleTrack) -> Option<ParsedSubtitle> {
        let cache = self.context.cache();

        if let Some(parsed) = cache.get::<ParsedSubtitle>(&track.url).await {
            debug!("Loaded subtitle from cache");
            return Some(parsed);
        }

        let content = self.download_subtitle(track).await?;

        let parsed = match parser::parse(&content, track.format) {
            Some(parsed) => parsed,
            None => {
                let detected = parser::detect_format(&content)?;
                debug!(declared = %track.format, %detected, "Declared format did not parse, using detected");
                parser::parse(&content, detected)?
            }
        };

        cache.save(&track.url, &parsed).await;
        info!(cues = parsed.len(), format = %parsed.format, "Subtitle loaded");
        Some(parsed)
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    /// Select a track, or clear the selection with `None`.
    pub fn select_track(&self, track: Option<SubtitleTrack>) {
        self.current_track.send_replace(track);
    }

    pub fn current_track(&self) -> Option<SubtitleTrack> {
        self.current_track.borrow().clone()
    }

    pub fn available_tracks(&self) -> Vec<SubtitleTrack> {
        self.available_tracks.borrow().clone()
    }

    pub fn subscribe_available_tracks(&self) -> watch::Receiver<Vec<SubtitleTrack>> {
        self.available_tracks.subscribe()
    }

    pub fn subscribe_current_track(&self) -> watch::Receiver<Option<SubtitleTrack>> {
        self.current_track.subscribe()
    }

    // ---------------------------------------------------------------------
    // Preferences
    // ---------------------------------------------------------------------

    pub async fn style(&self) -> SubtitleStyle {
        self.context.preferences().style().await
    }

    pub async fn set_style(&self, style: &SubtitleStyle) -> Result<()> {
        self.context.preferences().set_style(style).await?;
        Ok(())
    }

    pub async fn preferred_language(&self) -> String {
        self.context.preferences().preferred_language().await
    }

    pub async fn set_preferred_language(&self, language: &str) -> Result<()> {
        self.context
            .preferences()
            .set_preferred_language(language)
            .await?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Cache
    // ---------------------------------------------------------------------

    pub async fn cache_stats(&self) -> CacheStats {
        self.context.cache().stats().await
    }

    pub async fn clear_cache(&self) -> u64 {
        self.context.cache().clear().await
    }

    pub async fn clean_expired_cache(&self) -> u64 {
        self.context.cache().clean_expired().await
    }
}
