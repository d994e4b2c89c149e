//! Core subtitle domain types
//!
//! Queries, discovered tracks, and parsed cue sequences shared by the parser,
//! provider clients, aggregator and cache.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::language;

// =============================================================================
// Query
// =============================================================================

/// Search input handed to every provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleQuery {
    /// Free-text title of the video
    pub video_name: String,
    /// External content id (e.g. an IMDb id like `tt0133093`)
    pub external_id: Option<String>,
    /// Target language code
    pub language: String,
}

impl SubtitleQuery {
    pub fn new(video_name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            video_name: video_name.into(),
            external_id: None,
            language: language.into(),
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Language code normalized for provider requests.
    pub fn language_code(&self) -> String {
        language::normalize_code(&self.language)
    }
}

// =============================================================================
// Source
// =============================================================================

/// Where a subtitle track was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleSource {
    /// Carried inside the media container
    Embedded,
    OpenSubtitles,
    Yify,
    Podnapisi,
    Unknown,
}

impl SubtitleSource {
    /// Ranking weight; lower wins when the same language is offered twice.
    pub fn priority(&self) -> u32 {
        match self {
            Self::Embedded => 0,
            Self::OpenSubtitles => 1,
            Self::Yify => 2,
            Self::Podnapisi => 3,
            Self::Unknown => 999,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::OpenSubtitles => "opensubtitles",
            Self::Yify => "yify",
            Self::Podnapisi => "podnapisi",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Embedded => "Embedded",
            Self::OpenSubtitles => "OpenSubtitles",
            Self::Yify => "YIFY",
            Self::Podnapisi => "Podnapisi",
            Self::Unknown => "Unknown",
        }
    }

    /// Map a tag back to a source; unrecognized tags become `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "embedded" => Self::Embedded,
            "opensubtitles" => Self::OpenSubtitles,
            "yify" => Self::Yify,
            "podnapisi" => Self::Podnapisi,
            _ => Self::Unknown,
        }
    }

    /// Remote sources queried by a default aggregate search.
    pub fn remote() -> [SubtitleSource; 3] {
        [Self::OpenSubtitles, Self::Yify, Self::Podnapisi]
    }
}

impl fmt::Display for SubtitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Format
// =============================================================================

/// Timed-text format of a subtitle file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    #[default]
    Srt,
    Vtt,
    /// Advanced SubStation Alpha; also covers SSA
    Ass,
    Ttml,
}

impl SubtitleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Ass => "ass",
            Self::Ttml => "ttml",
        }
    }

    /// Map a free-form tag or file extension to a format.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "srt" | "subrip" => Some(Self::Srt),
            "vtt" | "webvtt" => Some(Self::Vtt),
            "ass" | "ssa" => Some(Self::Ass),
            "ttml" | "dfxp" | "xml" => Some(Self::Ttml),
            _ => None,
        }
    }

    /// Like [`from_tag`](Self::from_tag) but falls back to SRT, the format
    /// providers serve when they leave the field out.
    pub fn from_tag_or_default(tag: Option<&str>) -> Self {
        tag.and_then(Self::from_tag).unwrap_or_default()
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Track
// =============================================================================

/// A discovered subtitle that has not been downloaded yet.
///
/// Identity is `id`; two tracks with the same language code and display
/// name are duplicates for ranking purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// `"{source}_{provider_id}"`
    pub id: String,
    pub language_name: String,
    pub language_code: String,
    /// Download URL; also the cache key for parsed results
    pub url: String,
    pub format: SubtitleFormat,
    pub source: SubtitleSource,
    pub is_default: bool,
}

impl SubtitleTrack {
    /// Build a track from provider fields, normalizing the language and
    /// deriving a display name when the provider omits one.
    pub fn new(
        source: SubtitleSource,
        provider_id: impl fmt::Display,
        language: &str,
        language_name: Option<&str>,
        url: impl Into<String>,
        format: SubtitleFormat,
    ) -> Self {
        let language_code = language::normalize_code(language);
        let language_name = language_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| language::display_name(&language_code));

        Self {
            id: format!("{}_{}", source.as_str(), provider_id),
            language_name,
            language_code,
            url: url.into(),
            format,
            source,
            is_default: false,
        }
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Key under which duplicates collapse.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.language_code, &self.language_name)
    }
}

// =============================================================================
// Cues
// =============================================================================

/// One timed caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// Milliseconds from media start
    pub start_ms: u64,
    pub end_ms: u64,
    /// Display text; lines separated by `\n`
    pub text: String,
}

impl SubtitleCue {
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Whether `position_ms` falls in `[start, end)`.
    pub fn contains(&self, position_ms: u64) -> bool {
        self.start_ms <= position_ms && position_ms < self.end_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// A parsed subtitle file: its format plus cues in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSubtitle {
    pub format: SubtitleFormat,
    pub cues: Vec<SubtitleCue>,
}

impl ParsedSubtitle {
    pub fn new(format: SubtitleFormat, cues: Vec<SubtitleCue>) -> Self {
        Self { format, cues }
    }

    /// First cue showing at `position_ms`.
    pub fn cue_at(&self, position_ms: u64) -> Option<&SubtitleCue> {
        self.cues.iter().find(|cue| cue.contains(position_ms))
    }

    /// End of the last cue to disappear.
    pub fn duration_ms(&self) -> u64 {
        self.cues.iter().map(|cue| cue.end_ms).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}
