//! Re-running over the same output directory

use std::sync::Arc;
use tempfile::TempDir;

use crate::support::{test_config, FakeFetcher, Reply, API_BASE};
use fontshare_downloader::{OutcomeStatus, Pipeline, PipelineConfig, ResourceIdentifier};

fn fetcher_with(slugs: &[&str]) -> Arc<FakeFetcher> {
    let fetcher = Arc::new(FakeFetcher::new());
    fetcher.route(
        format!("{API_BASE}/fonts"),
        vec![Reply::json(&serde_json::json!(slugs).to_string())],
    );
    for slug in slugs {
        fetcher.font(slug, vec![Reply::archive(slug)]);
    }
    fetcher
}

#[tokio::test]
async fn test_second_run_skips_everything() {
    let temp = TempDir::new().unwrap();
    let fetcher = fetcher_with(&["satoshi", "zodiak", "switzer"]);

    let mut first = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
    let summary = first.run().await.unwrap();
    assert_eq!(summary.succeeded, 3);
    assert_eq!(fetcher.download_requests().len(), 3);

    let mut second = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
    let summary = second.run().await.unwrap();
    assert_eq!(summary.skipped, 3);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 0);
    assert!(summary
        .outcomes
        .iter()
        .all(|o| o.status == OutcomeStatus::Skipped && o.attempts == 0));
    assert_eq!(
        fetcher.download_requests().len(),
        3,
        "skipped fonts must not be requested"
    );
}

#[tokio::test]
async fn test_only_missing_fonts_are_downloaded() {
    let temp = TempDir::new().unwrap();
    let fetcher = fetcher_with(&["satoshi", "zodiak"]);

    let layout = fontshare_downloader::output::OutputLayout::new(temp.path());
    let existing = layout.artifact_path(&ResourceIdentifier::parse("satoshi").unwrap());
    std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
    std::fs::write(&existing, b"previous run").unwrap();

    let mut pipeline = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(fetcher.requests_for("satoshi"), 0);
    assert_eq!(fetcher.requests_for("zodiak"), 1);
    assert_eq!(std::fs::read(&existing).unwrap(), b"previous run");
}

#[tokio::test]
async fn test_empty_file_is_not_treated_as_downloaded() {
    let temp = TempDir::new().unwrap();
    let fetcher = fetcher_with(&["satoshi"]);

    let layout = fontshare_downloader::output::OutputLayout::new(temp.path());
    let existing = layout.artifact_path(&ResourceIdentifier::parse("satoshi").unwrap());
    std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
    std::fs::write(&existing, b"").unwrap();

    let mut pipeline = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(fetcher.requests_for("satoshi"), 1);
}

#[tokio::test]
async fn test_no_skip_existing_downloads_again() {
    let temp = TempDir::new().unwrap();
    let fetcher = fetcher_with(&["satoshi", "zodiak"]);

    let mut first = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
    first.run().await.unwrap();

    let config = PipelineConfig {
        skip_existing: false,
        ..test_config(temp.path())
    };
    let mut second = Pipeline::new(config, fetcher.clone()).unwrap();
    let summary = second.run().await.unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(fetcher.download_requests().len(), 4);
}

#[tokio::test]
async fn test_log_appends_across_runs() {
    let temp = TempDir::new().unwrap();
    let fetcher = fetcher_with(&["satoshi"]);

    for _ in 0..2 {
        let mut pipeline = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
        pipeline.run().await.unwrap();
    }

    let log_path = fontshare_downloader::output::OutputLayout::new(temp.path()).log_path();
    let log = std::fs::read_to_string(log_path).unwrap();
    assert_eq!(log.lines().filter(|l| l.contains(" SUCCEEDED satoshi ")).count(), 1);
    assert_eq!(log.lines().filter(|l| l.contains(" SKIPPED satoshi ")).count(), 1);
}
