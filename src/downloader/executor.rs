//! Bounded download worker pool
//!
//! [`DownloadExecutor::download_all`] drives one future per identifier through
//! `buffer_unordered(max_concurrent)`, so no more than `max_concurrent` tasks
//! hold a slot at any moment. Every request a task makes first waits on the
//! shared [`RateLimiter`].

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use super::config::{DownloadOptions, MAX_CONCURRENCY};
use super::job::{DownloadTask, TaskStatus};
use super::rate_limit::RateLimiter;
use super::retry::{FailureKind, RetryContext};
use super::DownloadError;
use crate::fetcher::HttpFetch;
use crate::identifier::ResourceIdentifier;
use crate::metrics::{DownloadMetrics, HttpRequestMetrics};
use crate::output::{write_stream_atomic, OutputError, OutputLayout};
use crate::report::{DownloadOutcome, ResultAggregator};
use crate::shutdown::{self, SharedShutdown};

/// Download endpoint for one font
pub fn download_url(api_base: &str, identifier: &ResourceIdentifier) -> String {
    format!(
        "{}/fonts/download/{}",
        api_base.trim_end_matches('/'),
        identifier
    )
}

/// Worker pool downloading font archives
pub struct DownloadExecutor {
    fetcher: Arc<dyn HttpFetch>,
    limiter: Arc<RateLimiter>,
    layout: OutputLayout,
    api_base: String,
    options: DownloadOptions,
    shutdown: Option<SharedShutdown>,
    progress: Option<ProgressBar>,
}

impl DownloadExecutor {
    /// Create an executor with default options
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        limiter: Arc<RateLimiter>,
        layout: OutputLayout,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            layout,
            api_base: api_base.into(),
            options: DownloadOptions::default(),
            shutdown: None,
            progress: None,
        }
    }

    /// Override pool options
    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach a shared shutdown handle for graceful cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Advance `progress` once per terminal outcome
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Pool options in effect
    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }

    /// Download every identifier, recording outcomes into `aggregator`
    ///
    /// Returns once every scheduled task is terminal. Identifiers still
    /// unscheduled when shutdown is requested are never started and produce
    /// no outcome. Returns the number of outcomes recorded.
    pub async fn download_all(
        &self,
        identifiers: &[ResourceIdentifier],
        aggregator: &ResultAggregator,
    ) -> usize {
        let concurrency = self.options.max_concurrent.clamp(1, MAX_CONCURRENCY);
        info!(
            tasks = identifiers.len(),
            concurrency,
            rate_limit_ms = self.limiter.interval().as_millis() as u64,
            "Starting download pool"
        );

        let mut outcomes = stream::iter(identifiers.iter().cloned())
            .map(|identifier| self.download_one(identifier))
            .buffer_unordered(concurrency);

        let mut recorded = 0;
        while let Some(outcome) = outcomes.next().await {
            let Some(outcome) = outcome else {
                continue;
            };
            if let Some(progress) = &self.progress {
                progress.inc(1);
                progress.set_message(format!("{} {}", outcome.status, outcome.identifier));
            }
            aggregator.record(outcome);
            recorded += 1;
        }

        if recorded < identifiers.len() {
            warn!(
                scheduled = recorded,
                total = identifiers.len(),
                "Shutdown requested; remaining fonts were not started"
            );
        }
        recorded
    }

    /// Run one task to a terminal status
    ///
    /// Returns `None` when shutdown was requested before the task started.
    pub async fn download_one(&self, identifier: ResourceIdentifier) -> Option<DownloadOutcome> {
        if self.shutdown_requested() {
            debug!(font = %identifier, "Not starting download after shutdown request");
            return None;
        }

        let span = info_span!("download", font = %identifier);
        let destination = self.layout.artifact_path(&identifier);
        let task = DownloadTask::new(identifier, destination);
        Some(self.run_task(task).instrument(span).await)
    }

    async fn run_task(&self, mut task: DownloadTask) -> DownloadOutcome {
        let started = Instant::now();

        if self.options.skip_existing {
            if let Some(size) = self.layout.existing_artifact_size(&task.identifier) {
                settle(&mut task, TaskStatus::Skipped);
                DownloadMetrics::record_skipped();
                info!(bytes = size, "Archive already present, skipping");
                return DownloadOutcome::skipped(&task, size, started.elapsed());
            }
        }

        settle(&mut task, TaskStatus::InFlight);
        let metrics = DownloadMetrics::start();

        match self.run_attempts(&mut task).await {
            Ok(bytes) => {
                settle(&mut task, TaskStatus::Succeeded);
                metrics.record_success();
                info!(bytes, attempts = task.attempts(), "Downloaded archive");
                DownloadOutcome::succeeded(&task, bytes, started.elapsed())
            }
            Err(err) => {
                settle(&mut task, TaskStatus::Failed);
                metrics.record_failure(err.reason());
                DownloadOutcome::failed(&task, err.to_string(), started.elapsed())
            }
        }
    }

    async fn run_attempts(&self, task: &mut DownloadTask) -> Result<u64, DownloadError> {
        let url = download_url(&self.api_base, &task.identifier);
        let max_attempts = self.options.max_attempts();

        loop {
            let attempt = task.record_attempt()?;
            let result = tokio::select! {
                biased;
                _ = shutdown::cancelled(self.shutdown.as_ref()) => {
                    warn!(attempt, "Abandoning in-flight download after shutdown request");
                    return Err(DownloadError::Cancelled);
                }
                result = self.attempt(&url, &task.destination, attempt) => result,
            };

            let err = match result {
                Ok(bytes) => return Ok(bytes),
                Err(err) => err,
            };
            let Some(kind) = err.kind() else {
                warn!(error = %err, "Download failed");
                return Err(err);
            };

            let ctx = RetryContext {
                attempt,
                max_attempts,
                identifier: task.identifier.as_str(),
                kind,
            };
            if err.is_retryable() && attempt < max_attempts {
                warn!("{}", ctx.format_retry());
                crate::metrics::record_retry(attempt, kind);
                continue;
            }
            warn!("{}", ctx.format_failure());
            return Err(err);
        }
    }

    async fn attempt(
        &self,
        url: &str,
        destination: &Path,
        attempt: u32,
    ) -> Result<u64, DownloadError> {
        self.limiter.acquire().await;

        let request = HttpRequestMetrics::start("download", attempt);
        let response = match self.fetcher.get(url).await {
            Ok(response) => response,
            Err(e) => {
                request.record_network_error();
                return Err(self.classify(FailureKind::from_fetcher_error(&e), e.to_string()));
            }
        };
        request.record_complete(response.status);

        if !response.is_success() {
            let status = response.status;
            return Err(self.classify(FailureKind::from_status(status), format!("HTTP {status}")));
        }

        match write_stream_atomic(destination, response.body).await {
            Ok(bytes) => Ok(bytes),
            Err(OutputError::StreamInterrupted(e)) => {
                Err(self.classify(FailureKind::from_fetcher_error(&e), e.to_string()))
            }
            Err(e) => Err(DownloadError::Persistence(e.to_string())),
        }
    }

    fn classify(&self, kind: FailureKind, message: String) -> DownloadError {
        if self.options.classification.is_retryable(kind) {
            DownloadError::Transient { kind, message }
        } else {
            DownloadError::Permanent { kind, message }
        }
    }
}

fn settle(task: &mut DownloadTask, next: TaskStatus) {
    if let Err(e) = task.transition(next) {
        warn!(error = %e, font = %task.identifier, "Ignoring invalid task transition");
    }
}
