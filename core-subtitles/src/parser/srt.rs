//! SubRip (`.srt`)

use regex::Regex;
use std::sync::LazyLock;

use super::clock_to_ms;
use crate::types::SubtitleCue;

/// `HH:MM:SS,mmm --> HH:MM:SS,mmm`; a `.` separator is tolerated.
static TIMING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d+):(\d{2}):(\d{2})[,.](\d{3})")
        .unwrap()
});

/// Split into blank-line-delimited blocks: index, timing, then text lines.
pub(crate) fn parse(content: &str) -> Vec<SubtitleCue> {
    let lines: Vec<&str> = content.split('\n').collect();
    lines
        .split(|line| line.trim().is_empty())
        .filter(|block| !block.is_empty())
        .filter_map(parse_block)
        .collect()
}

fn parse_block(lines: &[&str]) -> Option<SubtitleCue> {
    if lines.len() < 3 {
        return None;
    }

    let (start_ms, end_ms) = parse_timing(lines[1])?;
    let text = lines[2..].join("\n");

    Some(SubtitleCue::new(start_ms, end_ms, text))
}

fn parse_timing(line: &str) -> Option<(u64, u64)> {
    let caps = TIMING_PATTERN.captures(line)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());

    let start = clock_to_ms(field(1)?, field(2)?, field(3)?, field(4)?)?;
    let end = clock_to_ms(field(5)?, field(6)?, field(7)?, field(8)?)?;
    Some((start, end))
}
