//! Download worker pool and rate limiting
//!
//! # Overview
//!
//! 1. **Tasks**: one [`job::DownloadTask`] per identifier, walking the
//!    `Pending → InFlight → Succeeded | Failed` state machine
//! 2. **Execution**: [`executor::DownloadExecutor`] runs at most
//!    `max_concurrent` tasks at once
//! 3. **Rate Limiting**: every request waits on the shared
//!    [`rate_limit::RateLimiter`]
//! 4. **Retries**: failures are classified by [`retry::FailureKind`] and
//!    retried according to [`retry::RetryClassification`]
//!
//! # Error Handling
//!
//! Task-level failures never abort the pool. Each one is folded into a
//! failed outcome carrying the display form of its [`DownloadError`].

pub mod config;
pub mod executor;
pub mod job;
pub mod rate_limit;
pub mod retry;

pub use config::DownloadOptions;
pub use executor::DownloadExecutor;
pub use job::{DownloadTask, InvalidTransition, TaskStatus};
pub use rate_limit::RateLimiter;
pub use retry::{FailureKind, RetryClassification};

/// Download errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum DownloadError {
    /// Failure that may succeed on another attempt
    #[error("{kind}: {message}")]
    Transient {
        /// Classification
        kind: FailureKind,
        /// Detail from the transport or server
        message: String,
    },

    /// Failure that will not change on retry
    #[error("{kind}: {message}")]
    Permanent {
        /// Classification
        kind: FailureKind,
        /// Detail from the transport or server
        message: String,
    },

    /// Local filesystem failure while writing the archive
    #[error("failed to persist archive: {0}")]
    Persistence(String),

    /// Task state machine violation
    #[error(transparent)]
    State(#[from] InvalidTransition),

    /// Abandoned because shutdown was requested
    #[error("cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Whether another attempt may be made
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Classification of a network or HTTP failure
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Transient { kind, .. } | Self::Permanent { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Transient { .. } => "transient",
            Self::Permanent { .. } => "permanent",
            Self::Persistence(_) => "persistence",
            Self::State(_) => "state",
            Self::Cancelled => "cancelled",
        }
    }
}
