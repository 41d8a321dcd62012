//! Result aggregation and run reporting
//!
//! The [`ResultAggregator`] is handed to the worker pool explicitly. Workers
//! append terminal [`DownloadOutcome`]s in whatever order they finish; the
//! aggregator mirrors each one as a line in the run log and, once the pool is
//! drained, folds them into a [`RunSummary`]. Counts never depend on
//! completion order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::downloader::job::DownloadTask;
use crate::identifier::ResourceIdentifier;
use crate::output::OutputError;

pub mod manifest;

pub use manifest::{CatalogSnapshot, Manifest, ManifestEntry};

/// Report persistence errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Log file could not be opened
    #[error("failed to open log {path}: {source}")]
    LogOpen {
        /// Log path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Manifest or catalog could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        /// Target path
        path: PathBuf,
        /// Underlying error
        source: OutputError,
    },

    /// Manifest or catalog could not be read back
    #[error("failed to read {path}: {source}")]
    Read {
        /// Source path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// JSON (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Terminal status of a download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Archive written
    Succeeded,
    /// Gave up
    Failed,
    /// Archive already present
    Skipped,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        };
        f.write_str(label)
    }
}

/// Serialize a [`Duration`] as integer milliseconds
pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Immutable record of one finished task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    /// Font slug
    pub identifier: ResourceIdentifier,
    /// Terminal status
    pub status: OutcomeStatus,
    /// Archive size for succeeded and skipped tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    /// Last error for failed tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Requests issued
    pub attempts: u32,
    /// Wall time from scheduling to terminal status
    #[serde(rename = "elapsed_ms", with = "duration_millis")]
    pub elapsed: Duration,
    /// Archive path
    pub destination: PathBuf,
}

impl DownloadOutcome {
    /// Outcome for a task whose archive was written
    pub fn succeeded(task: &DownloadTask, bytes: u64, elapsed: Duration) -> Self {
        Self::from_task(task, OutcomeStatus::Succeeded, Some(bytes), None, elapsed)
    }

    /// Outcome for a task that gave up
    pub fn failed(task: &DownloadTask, error: impl Into<String>, elapsed: Duration) -> Self {
        Self::from_task(task, OutcomeStatus::Failed, None, Some(error.into()), elapsed)
    }

    /// Outcome for a task resolved from an existing archive
    pub fn skipped(task: &DownloadTask, existing_bytes: u64, elapsed: Duration) -> Self {
        Self::from_task(
            task,
            OutcomeStatus::Skipped,
            Some(existing_bytes),
            None,
            elapsed,
        )
    }

    fn from_task(
        task: &DownloadTask,
        status: OutcomeStatus,
        bytes: Option<u64>,
        error: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            identifier: task.identifier.clone(),
            status,
            bytes,
            error,
            attempts: task.attempts(),
            elapsed,
            destination: task.destination.clone(),
        }
    }

    /// Line written to the run log for this outcome
    pub fn log_line(&self, timestamp: DateTime<Utc>) -> String {
        let ts = timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
        let elapsed = self.elapsed.as_secs_f64();
        match self.status {
            OutcomeStatus::Succeeded => format!(
                "{ts} {} {} bytes={} attempts={} elapsed={elapsed:.2}s",
                self.status,
                self.identifier,
                self.bytes.unwrap_or(0),
                self.attempts
            ),
            OutcomeStatus::Skipped => format!(
                "{ts} {} {} bytes={} (already downloaded)",
                self.status,
                self.identifier,
                self.bytes.unwrap_or(0)
            ),
            OutcomeStatus::Failed => format!(
                "{ts} {} {} attempts={} elapsed={elapsed:.2}s error=\"{}\"",
                self.status,
                self.identifier,
                self.attempts,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Aggregate of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Tasks that reached a terminal status
    pub attempted: usize,
    /// Archives written this run
    pub succeeded: usize,
    /// Tasks that gave up
    pub failed: usize,
    /// Tasks resolved from existing archives
    pub skipped: usize,
    /// Bytes on disk for succeeded and skipped fonts
    pub total_bytes: u64,
    /// Wall time of the whole run
    #[serde(rename = "elapsed_ms", with = "duration_millis")]
    pub elapsed: Duration,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Name of the discovery strategy that produced the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_strategy: Option<String>,
    /// Whether the run was interrupted before every task was scheduled
    pub cancelled: bool,
    /// Run log location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
    /// Manifest location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,
    /// Outcomes in completion order
    pub outcomes: Vec<DownloadOutcome>,
}

impl RunSummary {
    /// Outcomes that failed, in completion order
    pub fn failures(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
    }

    /// Whether every task succeeded or was skipped
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }
}

/// Run-level facts the aggregator cannot see on its own
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
    /// Monotonic start of the run
    pub started: Instant,
    /// Discovery strategy that produced the catalog
    pub discovery_strategy: Option<String>,
    /// Whether shutdown was requested during the run
    pub cancelled: bool,
}

impl RunContext {
    /// Context starting now
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            discovery_strategy: None,
            cancelled: false,
        }
    }
}

/// Append-only collector of outcomes
#[derive(Debug)]
pub struct ResultAggregator {
    outcomes: Mutex<Vec<DownloadOutcome>>,
    log_file: Option<Mutex<File>>,
    log_path: Option<PathBuf>,
}

impl ResultAggregator {
    /// Aggregator without a log sink
    pub fn in_memory() -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
            log_file: None,
            log_path: None,
        }
    }

    /// Aggregator appending one line per outcome to `path`
    pub fn with_log_file(path: &Path) -> Result<Self, ReportError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ReportError::LogOpen {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ReportError::LogOpen {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            outcomes: Mutex::new(Vec::new()),
            log_file: Some(Mutex::new(file)),
            log_path: Some(path.to_path_buf()),
        })
    }

    /// Run log location, if any
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Append a free-form line to the run log
    pub fn log_event(&self, message: &str) {
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.append_line(&format!("{ts} RUN {message}"));
    }

    /// Record a terminal outcome
    ///
    /// Log write failures are reported through tracing and otherwise ignored;
    /// they never block or fail the pipeline.
    pub fn record(&self, outcome: DownloadOutcome) {
        self.append_line(&outcome.log_line(Utc::now()));
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome);
    }

    fn append_line(&self, line: &str) {
        let Some(log_file) = &self.log_file else {
            return;
        };
        let mut file = log_file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "{line}") {
            warn!(error = %e, "Failed to append to download log");
        }
    }

    /// Number of outcomes recorded so far
    pub fn len(&self) -> usize {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of recorded outcomes in completion order
    pub fn outcomes(&self) -> Vec<DownloadOutcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fold recorded outcomes into a summary
    pub fn summarize(&self, context: RunContext) -> RunSummary {
        let outcomes = self.outcomes();
        let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
        let succeeded = count(OutcomeStatus::Succeeded);
        let failed = count(OutcomeStatus::Failed);
        let skipped = count(OutcomeStatus::Skipped);
        let total_bytes = outcomes.iter().filter_map(|o| o.bytes).sum();
        let elapsed = context.started.elapsed();

        let summary = RunSummary {
            attempted: outcomes.len(),
            succeeded,
            failed,
            skipped,
            total_bytes,
            elapsed,
            started_at: context.started_at,
            finished_at: Utc::now(),
            discovery_strategy: context.discovery_strategy,
            cancelled: context.cancelled,
            log_path: self.log_path.clone(),
            manifest_path: None,
            outcomes,
        };

        self.log_event(&format!(
            "finished: {} succeeded, {} failed, {} skipped in {:.1}s{}",
            summary.succeeded,
            summary.failed,
            summary.skipped,
            summary.elapsed.as_secs_f64(),
            if summary.cancelled { " (cancelled)" } else { "" }
        ));
        summary
    }
}
