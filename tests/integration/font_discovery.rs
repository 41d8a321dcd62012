//! Catalog discovery through the pipeline

use std::sync::Arc;
use tempfile::TempDir;

use crate::support::{download_url, test_config, FakeFetcher, Reply, API_BASE, SITE_URL};
use fontshare_downloader::discovery::{
    DiscoveryError, FallbackList, PageScrapeStrategy, StructuredEndpointStrategy,
};
use fontshare_downloader::report::CatalogSnapshot;
use fontshare_downloader::{Pipeline, PipelineConfig, PipelineError, PipelineState};

fn catalog_page(slugs: &[String]) -> String {
    let links: String = slugs
        .iter()
        .map(|s| format!(r#"<li><a href="/fonts/{s}">{s}</a></li>"#))
        .collect();
    format!("<html><body><ul>{links}</ul></body></html>")
}

#[tokio::test]
async fn test_structured_listing_is_preferred() {
    let temp = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());
    fetcher.route(
        format!("{API_BASE}/fonts"),
        vec![Reply::json(
            r#"{"fonts": [{"slug": "satoshi", "name": "Satoshi", "category": "sans"}, {"slug": "zodiak"}]}"#,
        )],
    );
    fetcher.route(
        SITE_URL.to_string(),
        vec![Reply::html(&catalog_page(&["never-used".to_string()]))],
    );

    let pipeline = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
    let catalog = pipeline.discover().await.unwrap();

    assert_eq!(catalog.strategy, "structured-endpoint");
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.entries[0].display_name.as_deref(), Some("Satoshi"));
    assert!(!fetcher.get_urls().contains(&SITE_URL.to_string()));
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[tokio::test]
async fn test_scrape_used_when_structured_yields_nothing() {
    let temp = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());
    let slugs: Vec<String> = (1..=10).map(|i| format!("scraped-{i}")).collect();

    // First endpoint answers with an empty list, the others 404
    fetcher.route(format!("{API_BASE}/fonts"), vec![Reply::json(r#"{"fonts": []}"#)]);
    fetcher.route(SITE_URL.to_string(), vec![Reply::html(&catalog_page(&slugs))]);
    for slug in &slugs {
        fetcher.font(slug, vec![Reply::archive(slug)]);
    }

    let mut pipeline = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.discovery_strategy.as_deref(), Some("page-scrape"));
    assert_eq!(summary.succeeded, 10);
}

#[tokio::test]
async fn test_duplicate_names_collapse() {
    let temp = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());
    fetcher.route(
        format!("{API_BASE}/fonts"),
        vec![Reply::json(
            r#"["satoshi", "Satoshi", {"slug": "satoshi"}, " satoshi ", "zodiak"]"#,
        )],
    );
    fetcher.font("satoshi", vec![Reply::archive("satoshi")]);
    fetcher.font("zodiak", vec![Reply::archive("zodiak")]);

    let mut pipeline = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(fetcher.requests_for("satoshi"), 1);
}

#[tokio::test]
async fn test_exhausted_discovery_downloads_nothing() {
    let temp = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());

    let mut pipeline = Pipeline::new(test_config(temp.path()), fetcher.clone())
        .unwrap()
        .with_discoverer(vec![
            Box::new(StructuredEndpointStrategy::default()),
            Box::new(PageScrapeStrategy::default()),
        ]);

    match pipeline.run().await {
        Err(PipelineError::Discovery(DiscoveryError::Exhausted { attempted })) => {
            assert_eq!(attempted, vec!["structured-endpoint", "page-scrape"]);
        }
        other => panic!("expected exhausted discovery, got {other:?}"),
    }
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert!(fetcher.download_requests().is_empty());
    assert!(!pipeline.layout().manifest_path().exists());

    let log = std::fs::read_to_string(pipeline.layout().log_path()).unwrap();
    assert!(log.contains(" RUN aborted: "));
}

#[tokio::test]
async fn test_offline_run_falls_back_to_builtin_list() {
    let temp = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());
    let known = FallbackList::embedded().unwrap().fonts.len();

    let mut pipeline = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.discovery_strategy.as_deref(), Some("static-fallback"));
    assert_eq!(summary.attempted, known);
    assert_eq!(summary.failed, known);
    assert_eq!(pipeline.state(), PipelineState::Done);

    let snapshot = CatalogSnapshot::load(&pipeline.layout().catalog_path()).unwrap();
    assert_eq!(snapshot.total_count, known);
    assert_eq!(snapshot.strategy, "static-fallback");
    assert_eq!(snapshot.fonts.len(), known);
}

#[tokio::test]
async fn test_probe_adds_candidates_that_answer() {
    let temp = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());
    fetcher.head_status(download_url("inter"), 200);
    let known = FallbackList::embedded().unwrap().fonts.len();

    let config = PipelineConfig {
        probe_candidates: true,
        ..test_config(temp.path())
    };
    let pipeline = Pipeline::new(config, fetcher.clone()).unwrap();
    let catalog = pipeline.discover().await.unwrap();

    assert_eq!(catalog.len(), known + 1);
    assert_eq!(catalog.entries.last().unwrap().identifier.as_str(), "inter");
}

#[tokio::test]
async fn test_discover_writes_catalog_snapshot() {
    let temp = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());
    fetcher.route(
        format!("{API_BASE}/fonts/list"),
        vec![Reply::json(r#"{"data": ["general-sans", "clash-display"]}"#)],
    );

    let pipeline = Pipeline::new(test_config(temp.path()), fetcher.clone()).unwrap();
    pipeline.discover().await.unwrap();

    let snapshot = CatalogSnapshot::load(&pipeline.layout().catalog_path()).unwrap();
    assert_eq!(snapshot.total_count, 2);
    let fonts: Vec<_> = snapshot.fonts.iter().map(|f| f.as_str()).collect();
    assert_eq!(fonts, vec!["general-sans", "clash-display"]);
    assert!(fetcher.download_requests().is_empty());
}
