//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::downloader::config::{
    DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_RETRIES, DEFAULT_RATE_LIMIT_SECS,
    HTTP_CONNECT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS, MAX_CONCURRENCY, MAX_RATE_LIMIT_SECS,
    USER_AGENT,
};
use crate::downloader::{DownloadOptions, RetryClassification};
use crate::fetcher::HttpSettings;

/// Default API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.fontshare.com/v2";

/// Default public site URL
pub const DEFAULT_SITE_URL: &str = "https://www.fontshare.com";

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Concurrency outside `1..=MAX_CONCURRENCY`
    #[error("max_concurrent must be between 1 and {MAX_CONCURRENCY}, got {0}")]
    InvalidConcurrency(usize),

    /// Rate limit outside `0..=MAX_RATE_LIMIT_SECS`
    #[error("rate_limit_seconds must be between 0 and {MAX_RATE_LIMIT_SECS}, got {0}")]
    InvalidRateLimit(f64),

    /// Zero timeout
    #[error("{0} must be at least 1 second")]
    InvalidTimeout(&'static str),

    /// URL that is not http(s)
    #[error("{field} must be an http(s) URL, got {value:?}")]
    InvalidUrl {
        /// Offending field
        field: &'static str,
        /// Offending value
        value: String,
    },
}

/// Everything a pipeline run needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Output root
    pub output_dir: PathBuf,
    /// Minimum seconds between outbound requests
    pub rate_limit_seconds: f64,
    /// Downloads in flight at once
    pub max_concurrent: usize,
    /// Debug-level logging
    pub verbose: bool,
    /// Treat existing non-empty archives as done
    pub skip_existing: bool,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Which failures are retried
    pub retry_classification: RetryClassification,
    /// API base URL
    pub api_base_url: String,
    /// Public site URL
    pub site_url: String,
    /// HEAD-probe extra candidates when falling back to the built-in list
    pub probe_candidates: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./downloads"),
            rate_limit_seconds: DEFAULT_RATE_LIMIT_SECS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            verbose: false,
            skip_existing: true,
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: HTTP_CONNECT_TIMEOUT_SECS,
            retry_classification: RetryClassification::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            probe_candidates: false,
        }
    }
}

impl PipelineConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 || self.max_concurrent > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidConcurrency(self.max_concurrent));
        }
        if !(0.0..=MAX_RATE_LIMIT_SECS).contains(&self.rate_limit_seconds) {
            return Err(ConfigError::InvalidRateLimit(self.rate_limit_seconds));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("request_timeout_secs"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("connect_timeout_secs"));
        }
        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("site_url", &self.site_url),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Worker pool options derived from this config
    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            max_concurrent: self.max_concurrent,
            max_retries: self.max_retries,
            skip_existing: self.skip_existing,
            classification: self.retry_classification,
        }
    }

    /// HTTP client settings derived from this config
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: USER_AGENT.to_string(),
        }
    }
}
