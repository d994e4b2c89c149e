//! Podnapisi Client
//!
//! Keyword search over the aggregated JSON index.
//!
//! ## API Endpoints
//!
//! - **Search**: `{base}/subtitles/search?keywords={title}&language={lang}`
//!   returning `{ "data": [{id, language, language_name?, download_url, format?}] }`

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{endpoint, ProviderHttp, SubtitleProvider};
use crate::error::Result;
use crate::types::{SubtitleFormat, SubtitleQuery, SubtitleSource, SubtitleTrack};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: Option<String>,
    #[serde(default)]
    language: String,
    language_name: Option<String>,
    download_url: Option<String>,
    format: Option<String>,
}

pub struct PodnapisiClient {
    http: ProviderHttp,
    base_url: String,
}

impl PodnapisiClient {
    pub fn new(http: ProviderHttp, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SubtitleProvider for PodnapisiClient {
    fn source(&self) -> SubtitleSource {
        SubtitleSource::Podnapisi
    }

    #[instrument(skip(self), fields(video = %query.video_name, language = %query.language))]
    async fn search_subtitles(&self, query: &SubtitleQuery) -> Result<Vec<SubtitleTrack>> {
        let url = format!(
            "{}?keywords={}&language={}",
            endpoint(&self.base_url, "subtitles/search"),
            urlencoding::encode(&query.video_name),
            urlencoding::encode(&query.language_code())
        );
        let response: SearchResponse = self.http.get_json(&url).await?;

        let tracks: Vec<SubtitleTrack> = response
            .data
            .into_iter()
            .filter_map(|entry| {
                let id = entry.id.filter(|id| !id.is_empty())?;
                let url = entry.download_url.filter(|u| !u.trim().is_empty())?;
                Some(SubtitleTrack::new(
                    SubtitleSource::Podnapisi,
                    id,
                    &entry.language,
                    entry.language_name.as_deref(),
                    url,
                    SubtitleFormat::from_tag_or_default(entry.format.as_deref()),
                ))
            })
            .collect();

        info!(found = tracks.len(), "Podnapisi search complete");
        Ok(tracks)
    }

    async fn download_subtitle(&self, track: &SubtitleTrack) -> Result<String> {
        debug!(track = %track.id, "Downloading from Podnapisi");
        self.http.get_text(&track.url).await
    }
}
