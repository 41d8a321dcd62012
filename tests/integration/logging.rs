//! Tracing setup and the per-run download log

use std::sync::Arc;
use tempfile::TempDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::support::{test_config, FakeFetcher, Reply, API_BASE};
use fontshare_downloader::Pipeline;

#[test]
fn test_tracing_subscriber_initialization() {
    // May already be installed by another test in this binary
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fontshare_downloader=debug")),
        )
        .with_test_writer()
        .try_init();

    info!(font = "satoshi", bytes = 1024, "Downloaded archive");
    warn!(font = "zodiak", "Retrying");
}

#[test]
fn test_tracing_json_format() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("fontshare_downloader=info"))
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn test_run_log_has_one_line_per_outcome() {
    let temp = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());
    fetcher.route(
        format!("{API_BASE}/fonts"),
        vec![Reply::json(r#"["satoshi", "missing"]"#)],
    );
    fetcher.font("satoshi", vec![Reply::Ok(vec![0u8; 2048])]);

    let mut pipeline = Pipeline::new(test_config(temp.path()), fetcher).unwrap();
    let summary = pipeline.run().await.unwrap();

    let log = std::fs::read_to_string(summary.log_path.unwrap()).unwrap();
    let lines: Vec<&str> = log.lines().collect();

    assert!(lines[0].contains(" RUN started: 2 fonts discovered via structured-endpoint"));
    assert!(lines
        .iter()
        .any(|l| l.contains(" SUCCEEDED satoshi bytes=2048 attempts=1 ")));
    let failed = lines
        .iter()
        .find(|l| l.contains(" FAILED missing "))
        .expect("failure line");
    assert!(failed.contains("attempts=1"));
    assert!(failed.contains("error=\"resource not found (HTTP 404): HTTP 404\""));
    assert!(lines
        .last()
        .unwrap()
        .contains(" RUN finished: 1 succeeded, 1 failed, 0 skipped"));

    // Every line starts with an RFC 3339 timestamp
    for line in &lines {
        let ts = line.split(' ').next().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{line}");
    }
}
