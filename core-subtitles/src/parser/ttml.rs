//! Timed Text Markup Language (`.ttml`, `.dfxp`, `.xml`)
//!
//! Paragraphs are extracted with a single-line pattern; a `<p>` element whose
//! body spans several lines is not recognized.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::SubtitleCue;

static PARAGRAPH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<p\b[^>]*?\bbegin="([^"]*)"[^>]*?\bend="([^"]*)"[^>]*>(.*?)</p>"#).unwrap()
});

static CLOCK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2}(?:\.\d+)?)$").unwrap());

static BREAK_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br\s*/?>").unwrap());

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

pub(crate) fn parse(content: &str) -> Vec<SubtitleCue> {
    PARAGRAPH_PATTERN
        .captures_iter(content)
        .filter_map(|caps| {
            let start_ms = parse_time(caps.get(1)?.as_str())?;
            let end_ms = parse_time(caps.get(2)?.as_str())?;
            Some(SubtitleCue::new(start_ms, end_ms, clean_text(caps.get(3)?.as_str())))
        })
        .collect()
}

/// `12.5s`, `1500ms`, or clock form `H:MM:SS(.fff)`.
fn parse_time(raw: &str) -> Option<u64> {
    let raw = raw.trim();

    if let Some(millis) = raw.strip_suffix("ms") {
        return seconds_to_ms(millis.parse::<f64>().ok()? / 1_000.0);
    }

    if let Some(seconds) = raw.strip_suffix('s') {
        return seconds_to_ms(seconds.parse().ok()?);
    }

    let caps = CLOCK_PATTERN.captures(raw)?;
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;

    seconds_to_ms(hours * 3_600.0 + minutes * 60.0 + seconds)
}

fn seconds_to_ms(seconds: f64) -> Option<u64> {
    let millis = (seconds * 1_000.0).round();
    if !millis.is_finite() || millis < 0.0 || millis >= u64::MAX as f64 {
        return None;
    }
    Some(millis as u64)
}

fn clean_text(raw: &str) -> String {
    let with_breaks = BREAK_PATTERN.replace_all(raw, "\n");
    let stripped = TAG_PATTERN.replace_all(&with_breaks, "");
    decode_entities(&stripped)
}

fn decode_entities(text: &str) -> String {
    // `&amp;` last so `&amp;lt;` stays `&lt;`
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
