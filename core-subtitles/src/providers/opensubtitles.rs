//! OpenSubtitles Client
//!
//! Free-text title search.
//!
//! ## API Endpoints
//!
//! - **Search**: `{base}/search?query={title}&languages={lang}` returning a
//!   JSON array of `{id, language, language_name?, url, format?}`
//!
//! Entries without an id or URL are skipped.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{endpoint, ProviderHttp, SubtitleProvider};
use crate::error::Result;
use crate::types::{SubtitleFormat, SubtitleQuery, SubtitleSource, SubtitleTrack};

#[derive(Debug, Deserialize)]
struct SearchEntry {
    /// Numeric or string, depending on API version
    id: Option<Value>,
    #[serde(default)]
    language: String,
    language_name: Option<String>,
    url: Option<String>,
    format: Option<String>,
}

pub struct OpenSubtitlesClient {
    http: ProviderHttp,
    base_url: String,
}

impl OpenSubtitlesClient {
    pub fn new(http: ProviderHttp, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn search_url(&self, query: &SubtitleQuery) -> String {
        format!(
            "{}?query={}&languages={}",
            endpoint(&self.base_url, "search"),
            urlencoding::encode(&query.video_name),
            urlencoding::encode(&query.language_code())
        )
    }
}

#[async_trait]
impl SubtitleProvider for OpenSubtitlesClient {
    fn source(&self) -> SubtitleSource {
        SubtitleSource::OpenSubtitles
    }

    #[instrument(skip(self), fields(video = %query.video_name, language = %query.language))]
    async fn search_subtitles(&self, query: &SubtitleQuery) -> Result<Vec<SubtitleTrack>> {
        let url = self.search_url(query);
        let entries: Vec<SearchEntry> = self.http.get_json(&url).await?;
        let total = entries.len();

        let tracks: Vec<SubtitleTrack> = entries.into_iter().filter_map(to_track).collect();

        info!(found = tracks.len(), skipped = total - tracks.len(), "OpenSubtitles search complete");
        Ok(tracks)
    }

    async fn download_subtitle(&self, track: &SubtitleTrack) -> Result<String> {
        debug!(track = %track.id, "Downloading from OpenSubtitles");
        self.http.get_text(&track.url).await
    }
}

fn to_track(entry: SearchEntry) -> Option<SubtitleTrack> {
    let id = match entry.id? {
        Value::String(s) if !s.is_empty() => s,
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let url = entry.url.filter(|u| !u.trim().is_empty())?;

    Some(SubtitleTrack::new(
        SubtitleSource::OpenSubtitles,
        id,
        &entry.language,
        entry.language_name.as_deref(),
        url,
        SubtitleFormat::from_tag_or_default(entry.format.as_deref()),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::stub::StubHttpClient;
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    const BASE: &str = "https://os.example/api/v1";

    fn client(stub: &Arc<StubHttpClient>) -> OpenSubtitlesClient {
        let http = ProviderHttp::new(stub.clone(), Duration::from_secs(5), "test");
        OpenSubtitlesClient::new(http, BASE)
    }

    #[tokio::test]
    async fn test_search_maps_entries() {
        let body = r#"[
            {"id": 101, "language": "en", "language_name": "English", "url": "https://os.example/dl/101", "format": "srt"},
            {"id": "102", "language": "fre", "url": "https://os.example/dl/102", "format": "webvtt"},
            {"language": "en", "url": "https://os.example/dl/none"},
            {"id": 104, "language": "en"}
        ]"#;
        let stub = Arc::new(StubHttpClient::new().respond(
            "https://os.example/api/v1/search?query=The%20Matrix&languages=en",
            200,
            body,
        ));

        let tracks = client(&stub)
            .search_subtitles(&SubtitleQuery::new("The Matrix", "eng"))
            .await
            .unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "opensubtitles_101");
        assert_eq!(tracks[0].language_name, "English");
        assert_eq!(tracks[1].id, "opensubtitles_102");
        assert_eq!(tracks[1].language_code, "fr");
        assert_eq!(tracks[1].language_name, "French");
        assert_eq!(tracks[1].format, SubtitleFormat::Vtt);
        assert!(tracks.iter().all(|t| t.source == SubtitleSource::OpenSubtitles));
    }

    #[tokio::test]
    async fn test_unknown_format_defaults_to_srt() {
        let body = r#"[{"id": 1, "language": "en", "url": "https://os.example/dl/1", "format": "sub"}]"#;
        let stub = Arc::new(StubHttpClient::new().respond(
            "https://os.example/api/v1/search?query=x&languages=en",
            200,
            body,
        ));

        let tracks = client(&stub)
            .search_subtitles(&SubtitleQuery::new("x", "en"))
            .await
            .unwrap();
        assert_eq!(tracks[0].format, SubtitleFormat::Srt);
    }

    #[tokio::test]
    async fn test_error_status_propagates() {
        let stub = Arc::new(StubHttpClient::new().respond(
            "https://os.example/api/v1/search?query=x&languages=en",
            500,
            "",
        ));

        let result = client(&stub)
            .search_subtitles(&SubtitleQuery::new("x", "en"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_download_returns_body() {
        let stub = Arc::new(StubHttpClient::new().respond(
            "https://os.example/dl/1",
            200,
            "1\n00:00:01,000 --> 00:00:02,000\nHi\n",
        ));
        let track = SubtitleTrack::new(
            SubtitleSource::OpenSubtitles,
            1,
            "en",
            None,
            "https://os.example/dl/1",
            SubtitleFormat::Srt,
        );

        let body = client(&stub).download_subtitle(&track).await.unwrap();
        assert!(body.contains("Hi"));
    }
}
