//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, strip_path, LogFormat, LoggingConfig};

#[test]
fn test_logging_config_chain() {
    // Global initialization is tested once below; here only the builder
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}

#[test]
fn test_init_logging_only_once() {
    let first = init_logging(LoggingConfig::default().with_format(LogFormat::Json));
    assert!(first.is_ok());

    let second = init_logging(LoggingConfig::default());
    assert!(second.is_err(), "second global init must be rejected");
}

#[test]
fn test_invalid_filter_is_config_error() {
    let result = init_logging(LoggingConfig::default().with_filter("core_subtitles=[bad"));
    assert!(result.is_err());
}

#[test]
fn test_database_paths_are_stripped() {
    assert_eq!(strip_path("/home/user/.local/share/app/subtitles.db"), "subtitles.db");
    assert_eq!(strip_path("D:\\Movies\\film.ass"), "film.ass");
    assert_eq!(strip_path(""), "");
}
