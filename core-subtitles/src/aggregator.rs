//! # Source Aggregator
//!
//! Fans a query out to every requested provider at once, waits for all of
//! them, then merges the results into a single ranked list.
//!
//! ## Failure handling
//!
//! A provider that errors or exceeds the per-source timeout contributes no
//! tracks; the failure is logged and never reaches the caller. Dropping the
//! aggregate future (or firing the cancellation token) drops every in-flight
//! provider request with it.
//!
//! ## Ranking
//!
//! Tracks are stably sorted by language code, then by source priority, and
//! only the first track per (language code, language name) is kept. When two
//! sources offer the same language the higher-priority source wins.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use bridge_traits::http::HttpClient;
use core_runtime::config::{CoreConfig, DEFAULT_SOURCE_TIMEOUT, DEFAULT_USER_AGENT};

use crate::error::{Result, SubtitleError};
use crate::providers::{
    OpenSubtitlesClient, PodnapisiClient, ProviderEndpoints, ProviderHttp, SubtitleProvider,
    YifyClient,
};
use crate::types::{SubtitleQuery, SubtitleSource, SubtitleTrack};

pub struct SubtitleAggregator {
    providers: Vec<Arc<dyn SubtitleProvider>>,
    source_timeout: Duration,
}

impl SubtitleAggregator {
    /// An aggregator with no providers registered.
    pub fn new(source_timeout: Duration) -> Self {
        Self {
            providers: Vec::new(),
            source_timeout,
        }
    }

    /// The three remote clients against `endpoints`, with default user agent
    /// and per-source timeout.
    pub fn with_default_providers(
        http: Arc<dyn HttpClient>,
        endpoints: &ProviderEndpoints,
        request_timeout: Duration,
    ) -> Self {
        let http = ProviderHttp::new(http, request_timeout, DEFAULT_USER_AGENT);
        Self::remote(http, endpoints, DEFAULT_SOURCE_TIMEOUT)
    }

    /// The three remote clients configured from `config`.
    pub fn from_config(config: &CoreConfig) -> Self {
        let http = ProviderHttp::new(
            config.http_client.clone(),
            config.request_timeout,
            config.user_agent.clone(),
        );
        Self::remote(http, &config.endpoints, config.source_timeout)
    }

    fn remote(http: ProviderHttp, endpoints: &ProviderEndpoints, source_timeout: Duration) -> Self {
        Self::new(source_timeout)
            .with_provider(Arc::new(OpenSubtitlesClient::new(
                http.clone(),
                endpoints.opensubtitles.clone(),
            )))
            .with_provider(Arc::new(YifyClient::new(http.clone(), endpoints.yify.clone())))
            .with_provider(Arc::new(PodnapisiClient::new(
                http,
                endpoints.podnapisi.clone(),
            )))
    }

    /// Register a provider, replacing any already registered for its source.
    pub fn with_provider(mut self, provider: Arc<dyn SubtitleProvider>) -> Self {
        let source = provider.source();
        self.providers.retain(|p| p.source() != source);
        self.providers.push(provider);
        self
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Registered sources in registration order.
    pub fn sources(&self) -> Vec<SubtitleSource> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    fn provider(&self, source: SubtitleSource) -> Option<&Arc<dyn SubtitleProvider>> {
        self.providers.iter().find(|p| p.source() == source)
    }

    /// Search `sources` (all remote sources when `None`) concurrently and
    /// return the ranked, deduplicated union.
    #[instrument(skip(self, query), fields(video = %query.video_name, language = %query.language))]
    pub async fn search_all_sources(
        &self,
        query: &SubtitleQuery,
        sources: Option<&[SubtitleSource]>,
    ) -> Vec<SubtitleTrack> {
        let requested: Vec<SubtitleSource> = match sources {
            Some(list) => list.to_vec(),
            None => SubtitleSource::remote().to_vec(),
        };

        let mut seen = HashSet::new();
        let providers: Vec<&Arc<dyn SubtitleProvider>> = requested
            .into_iter()
            .filter(|source| seen.insert(*source))
            .filter_map(|source| {
                let provider = self.provider(source);
                if provider.is_none() {
                    debug!(%source, "No provider registered, skipping");
                }
                provider
            })
            .collect();

        let contributions =
            join_all(providers.into_iter().map(|p| self.search_one(p.as_ref(), query))).await;

        let merged: Vec<SubtitleTrack> = contributions.into_iter().flatten().collect();
        let total = merged.len();
        let ranked = rank_and_dedup(merged);

        info!(
            found = total,
            kept = ranked.len(),
            "Aggregate subtitle search complete"
        );
        ranked
    }

    /// Like [`search_all_sources`](Self::search_all_sources), but abandons
    /// every in-flight request when `cancel` fires.
    ///
    /// # Errors
    ///
    /// [`SubtitleError::Cancelled`] if the token fires before the search ends.
    pub async fn search_all_sources_cancellable(
        &self,
        query: &SubtitleQuery,
        sources: Option<&[SubtitleSource]>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SubtitleTrack>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(video = %query.video_name, "Aggregate subtitle search cancelled");
                Err(SubtitleError::Cancelled)
            }
            tracks = self.search_all_sources(query, sources) => Ok(tracks),
        }
    }

    async fn search_one(
        &self,
        provider: &dyn SubtitleProvider,
        query: &SubtitleQuery,
    ) -> Vec<SubtitleTrack> {
        let source = provider.source();

        let outcome = tokio::time::timeout(self.source_timeout, provider.search_subtitles(query))
            .await
            .unwrap_or_else(|_| {
                Err(SubtitleError::Timeout(format!(
                    "{} search exceeded {:?}",
                    source, self.source_timeout
                )))
            });

        match outcome {
            Ok(tracks) => {
                debug!(%source, count = tracks.len(), "Source search returned");
                tracks
            }
            Err(e) => {
                warn!(%source, error = %e, kind = ?e.kind(), "Source search failed");
                Vec::new()
            }
        }
    }

    /// Download `track` from the provider that listed it. Any failure is
    /// logged and reported as `None`.
    pub async fn download_subtitle(&self, track: &SubtitleTrack) -> Option<String> {
        match self.try_download_subtitle(track).await {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(track = %track.id, source = %track.source, error = %e, "Subtitle download failed");
                None
            }
        }
    }

    /// Bounded by the same per-source timeout as a search.
    ///
    /// # Errors
    ///
    /// [`SubtitleError::UnsupportedSource`] when no provider is registered for
    /// `track.source`, [`SubtitleError::Timeout`] when the download outlives
    /// the source timeout, otherwise whatever the provider reports.
    pub async fn try_download_subtitle(&self, track: &SubtitleTrack) -> Result<String> {
        let provider = self
            .provider(track.source)
            .ok_or(SubtitleError::UnsupportedSource(track.source))?;

        tokio::time::timeout(self.source_timeout, provider.download_subtitle(track))
            .await
            .unwrap_or_else(|_| {
                Err(SubtitleError::Timeout(format!(
                    "{} download exceeded {:?}",
                    track.source, self.source_timeout
                )))
            })
    }
}

/// Stable sort by (language code, source priority), then keep the first
/// track for each (language code, language name).
pub fn rank_and_dedup(mut tracks: Vec<SubtitleTrack>) -> Vec<SubtitleTrack> {
    tracks.sort_by(|a, b| {
        a.language_code
            .cmp(&b.language_code)
            .then_with(|| a.source.priority().cmp(&b.source.priority()))
    });

    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|track| seen.insert((track.language_code.clone(), track.language_name.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubtitleFormat;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Instant;

    enum Behavior {
        Tracks(Vec<SubtitleTrack>),
        Fail,
        Hang,
    }

    struct StubProvider {
        source: SubtitleSource,
        behavior: Behavior,
        calls: AtomicUsize,
        dropped: Arc<AtomicBool>,
    }

    impl StubProvider {
        fn new(source: SubtitleSource, behavior: Behavior) -> Self {
            Self {
                source,
                behavior,
                calls: AtomicUsize::new(0),
                dropped: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl SubtitleProvider for StubProvider {
        fn source(&self) -> SubtitleSource {
            self.source
        }

        async fn search_subtitles(&self, _query: &SubtitleQuery) -> Result<Vec<SubtitleTrack>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Tracks(tracks) => Ok(tracks.clone()),
                Behavior::Fail => Err(SubtitleError::Network("connection reset".into())),
                Behavior::Hang => {
                    let _flag = DropFlag(self.dropped.clone());
                    futures::future::pending::<()>().await;
                    Ok(Vec::new())
                }
            }
        }

        async fn download_subtitle(&self, track: &SubtitleTrack) -> Result<String> {
            match self.behavior {
                Behavior::Fail => Err(SubtitleError::SourceNotFound(track.url.clone())),
                Behavior::Hang => {
                    let _flag = DropFlag(self.dropped.clone());
                    futures::future::pending::<()>().await;
                    Ok(String::new())
                }
                Behavior::Tracks(_) => Ok(format!("content of {}", track.id)),
            }
        }
    }

    fn track(source: SubtitleSource, id: &str, language: &str) -> SubtitleTrack {
        SubtitleTrack::new(
            source,
            id,
            language,
            None,
            format!("https://subs.example/{}", id),
            SubtitleFormat::Srt,
        )
    }

    fn query() -> SubtitleQuery {
        SubtitleQuery::new("The Matrix", "en").with_external_id("tt0133093")
    }

    #[tokio::test]
    async fn test_duplicate_language_keeps_higher_priority_source() {
        let aggregator = SubtitleAggregator::new(Duration::from_secs(5))
            .with_provider(Arc::new(StubProvider::new(
                SubtitleSource::OpenSubtitles,
                Behavior::Tracks(vec![track(SubtitleSource::OpenSubtitles, "a", "en")]),
            )))
            .with_provider(Arc::new(StubProvider::new(
                SubtitleSource::Yify,
                Behavior::Tracks(vec![track(SubtitleSource::Yify, "b", "english")]),
            )))
            .with_provider(Arc::new(StubProvider::new(
                SubtitleSource::Podnapisi,
                Behavior::Fail,
            )));

        let tracks = aggregator.search_all_sources(&query(), None).await;

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "opensubtitles_a");
        assert_eq!(tracks[0].source, SubtitleSource::OpenSubtitles);
    }

    #[test]
    fn test_rank_orders_by_code_then_priority() {
        let tracks = vec![
            track(SubtitleSource::Podnapisi, "p-fr", "fr"),
            track(SubtitleSource::Yify, "y-en", "en"),
            track(SubtitleSource::Podnapisi, "p-de", "de"),
            track(SubtitleSource::OpenSubtitles, "o-fr", "fr"),
            track(SubtitleSource::Podnapisi, "p-en", "en"),
        ];

        let ranked = rank_and_dedup(tracks);
        let ids: Vec<&str> = ranked.iter().map(|t| t.id.as_str()).collect();

        assert_eq!(ids, vec!["podnapisi_p-de", "yify_y-en", "opensubtitles_o-fr"]);
    }

    #[test]
    fn test_same_code_different_label_both_kept() {
        let mut brazilian = track(SubtitleSource::Yify, "pt-br", "pt");
        brazilian.language_name = "Portuguese (Brazil)".into();
        let tracks = vec![track(SubtitleSource::OpenSubtitles, "pt", "pt"), brazilian];

        assert_eq!(rank_and_dedup(tracks).len(), 2);
    }

    #[tokio::test]
    async fn test_requested_sources_only() {
        let yify = Arc::new(StubProvider::new(
            SubtitleSource::Yify,
            Behavior::Tracks(vec![track(SubtitleSource::Yify, "y", "en")]),
        ));
        let opensubtitles = Arc::new(StubProvider::new(
            SubtitleSource::OpenSubtitles,
            Behavior::Tracks(vec![track(SubtitleSource::OpenSubtitles, "o", "en")]),
        ));
        let aggregator = SubtitleAggregator::new(Duration::from_secs(5))
            .with_provider(opensubtitles.clone())
            .with_provider(yify.clone());

        let tracks = aggregator
            .search_all_sources(
                &query(),
                Some(&[SubtitleSource::Yify, SubtitleSource::Yify, SubtitleSource::Embedded]),
            )
            .await;

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].source, SubtitleSource::Yify);
        assert_eq!(yify.calls.load(Ordering::SeqCst), 1);
        assert_eq!(opensubtitles.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hung_source_is_bounded_by_timeout() {
        let hung = Arc::new(StubProvider::new(SubtitleSource::Podnapisi, Behavior::Hang));
        let aggregator = SubtitleAggregator::new(Duration::from_millis(50))
            .with_provider(Arc::new(StubProvider::new(
                SubtitleSource::OpenSubtitles,
                Behavior::Tracks(vec![track(SubtitleSource::OpenSubtitles, "a", "en")]),
            )))
            .with_provider(hung.clone());

        let tracks = aggregator.search_all_sources(&query(), None).await;

        assert_eq!(tracks.len(), 1);
        assert!(hung.dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancellation_returns_promptly() {
        let hung = Arc::new(StubProvider::new(SubtitleSource::Yify, Behavior::Hang));
        let aggregator = SubtitleAggregator::new(Duration::from_secs(60)).with_provider(hung.clone());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = aggregator
            .search_all_sources_cancellable(&query(), None, &cancel)
            .await;

        assert!(matches!(result, Err(SubtitleError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(hung.calls.load(Ordering::SeqCst), 1);
        assert!(hung.dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_download_dispatch() {
        let aggregator = SubtitleAggregator::new(Duration::from_secs(5))
            .with_provider(Arc::new(StubProvider::new(
                SubtitleSource::OpenSubtitles,
                Behavior::Tracks(Vec::new()),
            )))
            .with_provider(Arc::new(StubProvider::new(SubtitleSource::Yify, Behavior::Fail)));

        let ok = track(SubtitleSource::OpenSubtitles, "a", "en");
        assert_eq!(
            aggregator.download_subtitle(&ok).await.as_deref(),
            Some("content of opensubtitles_a")
        );

        let failing = track(SubtitleSource::Yify, "b", "en");
        assert!(aggregator.download_subtitle(&failing).await.is_none());

        let unregistered = track(SubtitleSource::Podnapisi, "c", "en");
        assert!(aggregator.download_subtitle(&unregistered).await.is_none());
        assert!(matches!(
            aggregator.try_download_subtitle(&unregistered).await,
            Err(SubtitleError::UnsupportedSource(SubtitleSource::Podnapisi))
        ));
    }

    #[tokio::test]
    async fn test_hung_download_is_bounded_by_timeout() {
        let hung = Arc::new(StubProvider::new(SubtitleSource::Podnapisi, Behavior::Hang));
        let aggregator = SubtitleAggregator::new(Duration::from_millis(50)).with_provider(hung.clone());
        let stuck = track(SubtitleSource::Podnapisi, "slow", "en");

        let started = Instant::now();
        assert!(matches!(
            aggregator.try_download_subtitle(&stuck).await,
            Err(SubtitleError::Timeout(_))
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(hung.dropped.load(Ordering::SeqCst));

        assert!(aggregator.download_subtitle(&stuck).await.is_none());
    }

    #[test]
    fn test_default_providers_registered() {
        let http: Arc<dyn HttpClient> =
            Arc::new(crate::providers::stub::StubHttpClient::new());
        let aggregator = SubtitleAggregator::with_default_providers(
            http,
            &ProviderEndpoints::default(),
            Duration::from_secs(10),
        );

        assert_eq!(
            aggregator.sources(),
            vec![
                SubtitleSource::OpenSubtitles,
                SubtitleSource::Yify,
                SubtitleSource::Podnapisi
            ]
        );
    }
}
