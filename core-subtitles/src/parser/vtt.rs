//! WebVTT (`.vtt`)

use regex::Regex;
use std::sync::LazyLock;

use super::clock_to_ms;
use crate::types::SubtitleCue;

/// Hours are optional in VTT; cue settings after the end time are ignored.
static TIMING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(\d+):)?(\d{2}):(\d{2})\.(\d{3})\s*-->\s*(?:(\d+):)?(\d{2}):(\d{2})\.(\d{3})",
    )
    .unwrap()
});

pub(crate) fn parse(content: &str) -> Vec<SubtitleCue> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut cues = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        i += 1;

        if !line.contains("-->") {
            continue;
        }

        let Some((start_ms, end_ms)) = parse_timing(line) else {
            continue;
        };

        let mut text_lines = Vec::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            text_lines.push(lines[i]);
            i += 1;
        }

        cues.push(SubtitleCue::new(start_ms, end_ms, text_lines.join("\n")));
    }

    cues
}

fn parse_timing(line: &str) -> Option<(u64, u64)> {
    let caps = TIMING_PATTERN.captures(line)?;
    let field = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let start = clock_to_ms(field(1)?, field(2)?, field(3)?, field(4)?)?;
    let end = clock_to_ms(field(5)?, field(6)?, field(7)?, field(8)?)?;
    Some((start, end))
}
