//! Integration tests for rate limiting functionality

use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use crate::support::{test_config, FakeFetcher, Reply, API_BASE};
use fontshare_downloader::downloader::RateLimiter;
use fontshare_downloader::{Pipeline, PipelineConfig};

#[tokio::test]
async fn test_concurrent_acquires_are_spaced() {
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(50)));
    let started = Instant::now();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            })
        })
        .collect();

    let mut grants = Vec::new();
    for handle in handles {
        grants.push(handle.await.unwrap());
    }
    grants.sort();

    for pair in grants.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(40));
    }
    assert!(started.elapsed() >= Duration::from_millis(140));
}

#[tokio::test]
async fn test_download_requests_respect_rate_limit_at_any_concurrency() {
    let temp = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());
    let slugs: Vec<String> = (0..5).map(|i| format!("paced-{i}")).collect();
    fetcher.route(
        format!("{API_BASE}/fonts"),
        vec![Reply::json(&serde_json::json!(slugs).to_string())],
    );
    for slug in &slugs {
        fetcher.font(slug, vec![Reply::archive(slug)]);
    }

    let config = PipelineConfig {
        rate_limit_seconds: 0.05,
        max_concurrent: 5,
        ..test_config(temp.path())
    };
    let mut pipeline = Pipeline::new(config, fetcher.clone()).unwrap();
    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.succeeded, 5);

    let mut times: Vec<Instant> = fetcher.download_requests().into_iter().map(|(_, t)| t).collect();
    times.sort();
    assert_eq!(times.len(), 5);
    for pair in times.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_millis(40), "requests only {gap:?} apart");
    }
}

#[tokio::test]
async fn test_retries_wait_on_the_limiter() {
    let temp = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());
    fetcher.route(format!("{API_BASE}/fonts"), vec![Reply::json(r#"["flaky"]"#)]);
    fetcher.font(
        "flaky",
        vec![Reply::Status(503), Reply::Status(503), Reply::archive("flaky")],
    );

    let config = PipelineConfig {
        rate_limit_seconds: 0.05,
        ..test_config(temp.path())
    };
    let mut pipeline = Pipeline::new(config, fetcher.clone()).unwrap();
    pipeline.run().await.unwrap();

    let times: Vec<Instant> = fetcher.download_requests().into_iter().map(|(_, t)| t).collect();
    assert_eq!(times.len(), 3);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(40));
    }
}

#[tokio::test]
async fn test_zero_interval_does_not_throttle() {
    let limiter = RateLimiter::from_secs_f64(0.0);
    let started = Instant::now();
    for _ in 0..100 {
        limiter.acquire().await;
    }
    assert!(started.elapsed() < Duration::from_millis(50));
}
