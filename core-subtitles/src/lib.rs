//! # Subtitle Acquisition Module
//!
//! Finds, downloads, parses and caches subtitles for a video.
//!
//! ## Overview
//!
//! This module handles:
//! - Timed-text parsing for SRT, WebVTT, ASS/SSA and TTML, plus format detection
//! - Remote provider clients (OpenSubtitles, YIFY, Podnapisi)
//! - Concurrent multi-source search with ranking and deduplication
//! - An expiring, capacity-bounded cache of parsed results
//! - Subtitle preferences (language, auto-select, style, cache policy)

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod language;
pub mod parser;
pub mod preferences;
pub mod providers;
pub mod types;

pub use aggregator::{rank_and_dedup, SubtitleAggregator};
pub use cache::SubtitleCacheRepository;
pub use error::{ErrorKind, Result, SubtitleError};
pub use parser::{detect_format, parse, parse_detected, to_srt, try_parse};
pub use preferences::{
    SettingsSubtitlePreferences, SubtitlePosition, SubtitlePreferences, SubtitleStyle,
};
pub use providers::{ProviderEndpoints, ProviderHttp, SubtitleProvider};
pub use types::{
    ParsedSubtitle, SubtitleCue, SubtitleFormat, SubtitleQuery, SubtitleSource, SubtitleTrack,
};
