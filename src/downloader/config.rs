//! Download configuration constants

use super::retry::RetryClassification;

/// Default number of retries after the first failed attempt.
/// Fonts are small archives; three retries spaced by the shared rate limiter
/// ride out brief outages without hammering the service.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default number of downloads allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Upper bound on concurrency to prevent self-inflicted rate limiting.
pub const MAX_CONCURRENCY: usize = 32;

/// Default minimum spacing between outbound requests (seconds).
pub const DEFAULT_RATE_LIMIT_SECS: f64 = 1.0;

/// Largest accepted spacing between outbound requests (one day, in seconds).
pub const MAX_RATE_LIMIT_SECS: f64 = 86_400.0;

/// HTTP connect timeout (seconds) - time to establish TCP connection
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP request timeout (seconds) - overall time for the entire request
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("fontshare-downloader/", env!("CARGO_PKG_VERSION"));

/// Worker pool options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Maximum tasks in flight at once (≥ 1)
    pub max_concurrent: usize,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Treat existing non-empty archives as already downloaded
    pub skip_existing: bool,
    /// Which failures consume retry budget
    pub classification: RetryClassification,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_retries: DEFAULT_MAX_RETRIES,
            skip_existing: true,
            classification: RetryClassification::default(),
        }
    }
}

impl DownloadOptions {
    /// Total attempts a task may make (first try plus retries)
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
