//! # Timed-Text Parser
//!
//! Converts raw subtitle text into a normalized, ordered list of cues.
//!
//! ## Supported formats
//!
//! - **SRT**: numbered blocks with `HH:MM:SS,mmm` timings
//! - **VTT**: `WEBVTT` files, hours optional
//! - **ASS/SSA**: `Dialogue:` events with centisecond timings
//! - **TTML**: single-line `<p begin=".." end="..">` paragraphs
//!
//! Malformed blocks are skipped individually; a file only fails to parse when
//! no cue survives. Cues with blank text or an end before their start are
//! dropped in every format.
//!
//! ## Usage
//!
//! ```rust
//! use core_subtitles::parser::{detect_format, parse};
//! use core_subtitles::types::SubtitleFormat;
//!
//! let content = "1\n00:00:01,000 --> 00:00:02,500\nHello\n";
//! assert_eq!(detect_format(content), Some(SubtitleFormat::Srt));
//!
//! let parsed = parse(content, SubtitleFormat::Srt).unwrap();
//! assert_eq!(parsed.cues[0].end_ms, 2_500);
//! ```

mod ass;
mod srt;
mod ttml;
mod vtt;

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{Result, SubtitleError};
use crate::types::{ParsedSubtitle, SubtitleCue, SubtitleFormat};

/// An index line directly followed by an SRT timing line.
static SRT_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\d+\s*\n\s*\d+:\d{2}:\d{2},\d{3}\s*-->\s*\d+:\d{2}:\d{2},\d{3}").unwrap()
});

static TT_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\btt\b").unwrap());

const BOM: char = '\u{feff}';

/// Parse `content` as `format`. Returns `None` when nothing usable is found.
pub fn parse(content: &str, format: SubtitleFormat) -> Option<ParsedSubtitle> {
    match try_parse(content, format) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!(format = %format, error = %e, "Subtitle content rejected");
            None
        }
    }
}

/// Parse `content` as `format`.
///
/// # Errors
///
/// [`SubtitleError::Parse`] for blank input or when no cue survives.
pub fn try_parse(content: &str, format: SubtitleFormat) -> Result<ParsedSubtitle> {
    let normalized = normalize(content);
    if normalized.trim().is_empty() {
        return Err(SubtitleError::Parse("content is empty".to_string()));
    }

    let raw = match format {
        SubtitleFormat::Srt => srt::parse(&normalized),
        SubtitleFormat::Vtt => vtt::parse(&normalized),
        SubtitleFormat::Ass => ass::parse(&normalized),
        SubtitleFormat::Ttml => ttml::parse(&normalized),
    };
    let total = raw.len();
    let cues = retain_valid(raw);

    debug!(
        format = %format,
        cues = cues.len(),
        dropped = total - cues.len(),
        "Parsed subtitle content"
    );

    if cues.is_empty() {
        return Err(SubtitleError::Parse(format!(
            "no cues found in {} content",
            format
        )));
    }

    Ok(ParsedSubtitle::new(format, cues))
}

/// Guess the format of `content`.
///
/// Checks run in priority order: a `WEBVTT` header wins over anything else,
/// then an `[Script Info]` section, then XML with a `tt` element, then an SRT
/// index/timing pair anywhere in the text.
pub fn detect_format(content: &str) -> Option<SubtitleFormat> {
    let normalized = normalize(content);
    let head = normalized.trim_start();

    if head.starts_with("WEBVTT") {
        return Some(SubtitleFormat::Vtt);
    }

    if normalized.contains("[Script Info]") {
        return Some(SubtitleFormat::Ass);
    }

    if normalized.contains("<?xml") && TT_TOKEN.is_match(&normalized) {
        return Some(SubtitleFormat::Ttml);
    }

    if SRT_SIGNATURE.is_match(&normalized) {
        return Some(SubtitleFormat::Srt);
    }

    None
}

/// Detect the format, then parse.
pub fn parse_detected(content: &str) -> Option<ParsedSubtitle> {
    let format = detect_format(content)?;
    parse(content, format)
}

/// Render a timestamp as `HH:MM:SS,mmm`.
pub fn format_srt_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Serialize cues as SubRip, numbering from 1.
pub fn to_srt(subtitle: &ParsedSubtitle) -> String {
    subtitle
        .cues
        .iter()
        .enumerate()
        .map(|(i, cue)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                format_srt_timestamp(cue.start_ms),
                format_srt_timestamp(cue.end_ms),
                cue.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `None` when the timestamp does not fit in a `u64` of milliseconds.
pub(crate) fn clock_to_ms(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<u64> {
    hours
        .checked_mul(3_600_000)?
        .checked_add(minutes.checked_mul(60_000)?)?
        .checked_add(seconds.checked_mul(1_000)?)?
        .checked_add(millis)
}

/// Strip a leading BOM and fold `\r\n` / `\r` to `\n`.
fn normalize(content: &str) -> String {
    content
        .strip_prefix(BOM)
        .unwrap_or(content)
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

fn retain_valid(cues: Vec<SubtitleCue>) -> Vec<SubtitleCue> {
    cues.into_iter()
        .filter_map(|cue| {
            let text = cue.text.trim();
            if text.is_empty() || cue.end_ms < cue.start_ms {
                return None;
            }
            Some(SubtitleCue::new(cue.start_ms, cue.end_ms, text))
        })
        .collect()
}
