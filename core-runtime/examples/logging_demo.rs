//! Logging setup demonstration
//!
//! Run with:
//! ```bash
//! cargo run --example logging_demo
//! cargo run --example logging_demo -- json
//! cargo run --example logging_demo -- compact "core_runtime=trace"
//! ```

use bridge_traits::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, strip_query, LogFormat, LoggingConfig};
use std::env;
use tracing::{debug, info, instrument, warn};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_pii_redaction(true)
        .with_spans(true);
    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    if let Err(err) = init_logging(config) {
        eprintln!("failed to initialize logging: {}", err);
        return;
    }

    info!(format = ?format, "Logging initialized");
    list_folder("home", "/movies", 3).await;
    refresh_account("home", "AccessTokenInvalid").await;
    link_file("home", "https://bj29.cn-beijing.data.alicloudccp.com/a.mkv?x-oss-expires=1&auth_key=abc");
}

#[instrument]
async fn list_folder(account: &str, path: &str, pages: u32) {
    for page in 1..=pages {
        debug!(page, entries = 100, "Fetched listing page");
    }
    info!(total = pages * 100, "Listing cached");
}

#[instrument]
async fn refresh_account(account: &str, code: &str) {
    warn!("Session expired, refreshing before retry");
    info!(
        access_token = %redact_if_sensitive("access_token", "eyJhbGciOi..."),
        "Account credentials refreshed"
    );
}

fn link_file(account: &str, url: &str) {
    info!(account, url = %strip_query(url), "Resolved direct link");
}
