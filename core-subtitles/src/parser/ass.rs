//! Advanced SubStation Alpha / SSA (`.ass`, `.ssa`)

use regex::Regex;
use std::sync::LazyLock;

use super::clock_to_ms;
use crate::types::SubtitleCue;

/// `H:MM:SS.cc` (centiseconds)
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2})\.(\d{2})$").unwrap());

/// Override blocks such as `{\an8}` or `{\i1}`
static OVERRIDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]*\}").unwrap());

const DIALOGUE_PREFIX: &str = "Dialogue:";

/// Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
const DIALOGUE_FIELDS: usize = 10;

pub(crate) fn parse(content: &str) -> Vec<SubtitleCue> {
    content
        .split('\n')
        .filter_map(|line| line.trim_start().strip_prefix(DIALOGUE_PREFIX))
        .filter_map(parse_dialogue)
        .collect()
}

fn parse_dialogue(body: &str) -> Option<SubtitleCue> {
    // The text field may itself contain commas
    let fields: Vec<&str> = body.splitn(DIALOGUE_FIELDS, ',').collect();
    if fields.len() < DIALOGUE_FIELDS {
        return None;
    }

    let start_ms = parse_time(fields[1])?;
    let end_ms = parse_time(fields[2])?;

    Some(SubtitleCue::new(start_ms, end_ms, clean_text(fields[9])))
}

fn parse_time(raw: &str) -> Option<u64> {
    let caps = TIME_PATTERN.captures(raw.trim())?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());

    clock_to_ms(field(1)?, field(2)?, field(3)?, field(4)?.checked_mul(10)?)
}

fn clean_text(raw: &str) -> String {
    OVERRIDE_PATTERN
        .replace_all(raw, "")
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_centiseconds() {
        assert_eq!(parse_time("0:00:01.50"), Some(1_500));
        assert_eq!(parse_time("1:02:03.04"), Some(3_723_040));
        assert_eq!(parse_time("0:00:01.5"), None);
    }

    #[test]
    fn test_text_with_commas_and_overrides() {
        let cues = parse(
            "Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,{\\i1}Well,{\\i0} hello\\Nthere\\hfriend",
        );

        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Well, hello\nthere friend");
    }

    #[test]
    fn test_non_dialogue_lines_ignored() {
        let cues = parse("Comment: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,hidden\nStyle: Default,Arial");
        assert!(cues.is_empty());
    }

    #[test]
    fn test_too_few_fields_skipped() {
        assert!(parse("Dialogue: 0,0:00:01.00,0:00:02.00,Default").is_empty());
    }
}
