//! Observability metrics for the font downloader
//!
//! Counters and histograms go through the `metrics` facade. When no recorder
//! is installed every call is a no-op, so library users and tests pay nothing.
//! The binary installs a Prometheus exporter when `--metrics-addr` is given.
//!
//! ## Exported series
//!
//! - `http_requests_total{endpoint,status}` and `http_request_duration_seconds`
//! - `http_retries_total{kind}`
//! - `rate_limit_wait_seconds`
//! - `downloads_completed_total`, `downloads_failed_total`, `downloads_skipped_total`
//! - `download_duration_seconds`

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::downloader::retry::FailureKind;

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<RwLock<bool>> = Lazy::new(|| RwLock::new(false));

/// Correlation ID generator for request tracing
static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Initialize the Prometheus exporter
///
/// Idempotent: later calls return immediately.
///
/// # Errors
/// Fails if the listener cannot be bound or a recorder is already installed.
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "Total number of HTTP requests made to Fontshare"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "Time until response headers were received"
    );
    describe_counter!(
        "http_retries_total",
        Unit::Count,
        "Total number of download retries"
    );
    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time spent waiting for a rate limiter grant"
    );
    describe_counter!(
        "downloads_completed_total",
        Unit::Count,
        "Font archives written"
    );
    describe_counter!(
        "downloads_failed_total",
        Unit::Count,
        "Font downloads that gave up"
    );
    describe_counter!(
        "downloads_skipped_total",
        Unit::Count,
        "Font downloads skipped because the archive already existed"
    );
    describe_histogram!(
        "download_duration_seconds",
        Unit::Seconds,
        "Wall time of a download task including retries"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Check if the exporter is installed
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Generate a new correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    let id = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("req-{id:08x}")
}

/// Record time spent waiting on the rate limiter
pub fn record_rate_limit_wait(wait: Duration) {
    histogram!("rate_limit_wait_seconds").record(wait.as_secs_f64());
}

/// Record that a failed attempt is being retried
pub fn record_retry(attempt: u32, kind: FailureKind) {
    counter!(
        "http_retries_total",
        "kind" => kind.description(),
    )
    .increment(1);
    debug!(attempt, kind = %kind, "Retry recorded");
}

/// Timing and outcome of one HTTP request
pub struct HttpRequestMetrics {
    endpoint: &'static str,
    start_time: Instant,
    correlation_id: String,
    attempt: u32,
}

impl HttpRequestMetrics {
    /// Start recording a request against a named endpoint class
    pub fn start(endpoint: &'static str, attempt: u32) -> Self {
        let correlation_id = generate_correlation_id();
        debug!(
            correlation_id = %correlation_id,
            endpoint,
            attempt,
            "Starting HTTP request"
        );
        Self {
            endpoint,
            start_time: Instant::now(),
            correlation_id,
            attempt,
        }
    }

    /// Record a response with `status_code`
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();

        counter!(
            "http_requests_total",
            "endpoint" => self.endpoint,
            "status" => status_code.to_string(),
        )
        .increment(1);
        histogram!(
            "http_request_duration_seconds",
            "endpoint" => self.endpoint,
        )
        .record(duration.as_secs_f64());

        if status_code == 429 {
            warn!(
                correlation_id = %self.correlation_id,
                endpoint = self.endpoint,
                attempt = self.attempt,
                "Rate limit error (429) received"
            );
        }

        debug!(
            correlation_id = %self.correlation_id,
            endpoint = self.endpoint,
            status = status_code,
            duration_ms = duration.as_millis() as u64,
            "HTTP request completed"
        );
    }

    /// Record a transport failure (no status code)
    pub fn record_network_error(&self) {
        counter!(
            "http_requests_total",
            "endpoint" => self.endpoint,
            "status" => "network_error",
        )
        .increment(1);

        debug!(
            correlation_id = %self.correlation_id,
            endpoint = self.endpoint,
            attempt = self.attempt,
            duration_ms = self.start_time.elapsed().as_millis() as u64,
            "HTTP request failed before a response"
        );
    }
}

/// Per-task download metrics
pub struct DownloadMetrics {
    start_time: Instant,
}

impl DownloadMetrics {
    /// Start tracking a download task
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Record a written archive
    pub fn record_success(&self) {
        counter!("downloads_completed_total").increment(1);
        histogram!("download_duration_seconds").record(self.start_time.elapsed().as_secs_f64());
    }

    /// Record a task that gave up
    pub fn record_failure(&self, reason: &'static str) {
        counter!("downloads_failed_total", "reason" => reason).increment(1);
        histogram!("download_duration_seconds").record(self.start_time.elapsed().as_secs_f64());
    }

    /// Record an archive that already existed
    pub fn record_skipped() {
        counter!("downloads_skipped_total").increment(1);
    }
}
