//! Integration tests for logging system

use bridge_traits::LogLevel;
use core_runtime::logging::{redact_if_sensitive, strip_query, LogFormat, LoggingConfig};

#[test]
fn test_logging_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_pii_redaction(false)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.redact_pii);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}

#[test]
fn test_credentials_are_redacted() {
    for field in [
        "access_token",
        "refresh_token",
        "password",
        "client_secret",
        "cookie",
        "Authorization",
    ] {
        assert_eq!(redact_if_sensitive(field, "value"), "[REDACTED]", "{}", field);
    }
}

#[test]
fn test_signed_links_lose_their_signature() {
    let link = "https://download.example.com/file.mkv?auth_key=1700000000-0-0-abc&x-oss-expires=1";
    assert_eq!(
        redact_if_sensitive("url", link),
        "https://download.example.com/file.mkv"
    );
    assert_eq!(strip_query(link), "https://download.example.com/file.mkv");
}

#[test]
fn test_plain_values_pass_through() {
    assert_eq!(redact_if_sensitive("account", "home"), "home");
    assert_eq!(redact_if_sensitive("path", "/movies/2024"), "/movies/2024");
    assert_eq!(redact_if_sensitive("pages", "3"), "3");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}
