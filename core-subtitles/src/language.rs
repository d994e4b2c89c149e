//! Language code normalization
//!
//! Providers label languages inconsistently (`"EN-us"`, `"eng"`, `"english"`).
//! Everything is folded to lowercase ISO 639-1 where the language is known;
//! unknown codes are lowercased and passed through.

/// (ISO 639-1, ISO 639-2 codes, English name)
const LANGUAGES: &[(&str, &[&str], &str)] = &[
    ("ar", &["ara"], "Arabic"),
    ("bg", &["bul"], "Bulgarian"),
    ("cs", &["cze", "ces"], "Czech"),
    ("da", &["dan"], "Danish"),
    ("de", &["ger", "deu"], "German"),
    ("el", &["gre", "ell"], "Greek"),
    ("en", &["eng"], "English"),
    ("es", &["spa"], "Spanish"),
    ("fa", &["per", "fas"], "Persian"),
    ("fi", &["fin"], "Finnish"),
    ("fr", &["fre", "fra"], "French"),
    ("he", &["heb"], "Hebrew"),
    ("hi", &["hin"], "Hindi"),
    ("hr", &["hrv"], "Croatian"),
    ("hu", &["hun"], "Hungarian"),
    ("id", &["ind"], "Indonesian"),
    ("it", &["ita"], "Italian"),
    ("ja", &["jpn"], "Japanese"),
    ("ko", &["kor"], "Korean"),
    ("ms", &["may", "msa"], "Malay"),
    ("nl", &["dut", "nld"], "Dutch"),
    ("no", &["nor"], "Norwegian"),
    ("pl", &["pol"], "Polish"),
    ("pt", &["por"], "Portuguese"),
    ("ro", &["rum", "ron"], "Romanian"),
    ("ru", &["rus"], "Russian"),
    ("sl", &["slv"], "Slovenian"),
    ("sr", &["srp"], "Serbian"),
    ("sv", &["swe"], "Swedish"),
    ("th", &["tha"], "Thai"),
    ("tr", &["tur"], "Turkish"),
    ("uk", &["ukr"], "Ukrainian"),
    ("vi", &["vie"], "Vietnamese"),
    ("zh", &["chi", "zho"], "Chinese"),
];

/// Normalize a provider language label to a lowercase ISO 639-1 code.
///
/// ```
/// use core_subtitles::language::normalize_code;
///
/// assert_eq!(normalize_code("EN-us"), "en");
/// assert_eq!(normalize_code("eng"), "en");
/// assert_eq!(normalize_code("English"), "en");
/// assert_eq!(normalize_code("tlh"), "tlh");
/// ```
pub fn normalize_code(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    // Region and script subtags are dropped
    let primary = lowered
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_string();

    LANGUAGES
        .iter()
        .find(|(code, alpha3, name)| {
            *code == primary
                || alpha3.contains(&primary.as_str())
                || name.eq_ignore_ascii_case(&primary)
        })
        .map(|(code, _, _)| (*code).to_string())
        .unwrap_or(primary)
}

/// English display name for a normalized code; unknown codes are returned
/// as-is.
pub fn display_name(code: &str) -> String {
    let normalized = normalize_code(code);
    LANGUAGES
        .iter()
        .find(|(iso, _, _)| *iso == normalized)
        .map(|(_, _, name)| (*name).to_string())
        .unwrap_or(normalized)
}

/// Whether two labels name the same language.
pub fn same_language(a: &str, b: &str) -> bool {
    normalize_code(a) == normalize_code(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_variants() {
        assert_eq!(normalize_code("en"), "en");
        assert_eq!(normalize_code(" EN-us "), "en");
        assert_eq!(normalize_code("pt_BR"), "pt");
        assert_eq!(normalize_code("fre"), "fr");
        assert_eq!(normalize_code("fra"), "fr");
        assert_eq!(normalize_code("spanish"), "es");
        assert_eq!(normalize_code("Chinese"), "zh");
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        assert_eq!(normalize_code("TLH"), "tlh");
        assert_eq!(normalize_code("xx-YY"), "xx");
        assert_eq!(normalize_code(""), "");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("en"), "English");
        assert_eq!(display_name("ger"), "German");
        assert_eq!(display_name("tlh"), "tlh");
    }

    #[test]
    fn test_same_language() {
        assert!(same_language("eng", "en-GB"));
        assert!(!same_language("en", "es"));
    }
}
