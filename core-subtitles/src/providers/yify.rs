//! YIFY Subtitles Client
//!
//! Lookup by IMDb id only; a query without an external id yields nothing and
//! makes no request.
//!
//! ## API Endpoints
//!
//! - **Movie**: `{base}/movie-imdb/{id}` returning
//!   `{ "<lang>": { "<opaque id>": { url, language?, format?, rating? } } }`
//!
//! Both levels are walked in key order so results are deterministic.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use super::{endpoint, ProviderHttp, SubtitleProvider};
use crate::error::Result;
use crate::types::{SubtitleFormat, SubtitleQuery, SubtitleSource, SubtitleTrack};

#[derive(Debug, Deserialize)]
struct MovieEntry {
    #[serde(default)]
    url: String,
    language: Option<String>,
    format: Option<String>,
}

type MovieResponse = BTreeMap<String, BTreeMap<String, MovieEntry>>;

pub struct YifyClient {
    http: ProviderHttp,
    base_url: String,
}

impl YifyClient {
    pub fn new(http: ProviderHttp, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SubtitleProvider for YifyClient {
    fn source(&self) -> SubtitleSource {
        SubtitleSource::Yify
    }

    #[instrument(skip(self), fields(video = %query.video_name))]
    async fn search_subtitles(&self, query: &SubtitleQuery) -> Result<Vec<SubtitleTrack>> {
        let Some(imdb_id) = query
            .external_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            debug!("No external id, skipping YIFY");
            return Ok(Vec::new());
        };

        let url = endpoint(
            &self.base_url,
            &format!("movie-imdb/{}", urlencoding::encode(imdb_id)),
        );
        let languages: MovieResponse = self.http.get_json(&url).await?;

        let tracks: Vec<SubtitleTrack> = languages
            .into_iter()
            .flat_map(|(language_key, entries)| {
                entries
                    .into_iter()
                    .filter(|(_, entry)| !entry.url.trim().is_empty())
                    .map(move |(entry_id, entry)| {
                        let language = entry.language.as_deref().unwrap_or(&language_key);
                        SubtitleTrack::new(
                            SubtitleSource::Yify,
                            entry_id,
                            language,
                            None,
                            entry.url.clone(),
                            SubtitleFormat::from_tag_or_default(entry.format.as_deref()),
                        )
                    })
            })
            .collect();

        info!(imdb_id, found = tracks.len(), "YIFY search complete");
        Ok(tracks)
    }

    async fn download_subtitle(&self, track: &SubtitleTrack) -> Result<String> {
        debug!(track = %track.id, "Downloading from YIFY");
        self.http.get_text(&track.url).await
    }
}
