//! Failure classification and retry messaging
//!
//! Each failed attempt is mapped to a [`FailureKind`]. The configured
//! [`RetryClassification`] then decides whether that kind consumes retry
//! budget or fails the task immediately.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::fetcher::FetcherError;

/// Classification of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request exceeded its timeout
    NetworkTimeout,
    /// Connection refused, DNS failure, or other offline scenarios
    NetworkOffline,
    /// Body stream broke off mid-download
    BodyInterrupted,
    /// HTTP 429
    RateLimit,
    /// HTTP 408 / 425
    RequestTimeout(u16),
    /// HTTP 5xx
    ServerError(u16),
    /// HTTP 404 / 410
    NotFound(u16),
    /// HTTP 401 / 403 / 451
    AccessDenied(u16),
    /// Any other non-success status
    UnexpectedStatus(u16),
    /// Generic fallback when no better classification fits
    NetworkGeneric,
}

impl FailureKind {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimit,
            408 | 425 => Self::RequestTimeout(status),
            404 | 410 => Self::NotFound(status),
            401 | 403 | 451 => Self::AccessDenied(status),
            500..=599 => Self::ServerError(status),
            _ => Self::UnexpectedStatus(status),
        }
    }

    /// Classify a transport error
    pub fn from_fetcher_error(err: &FetcherError) -> Self {
        match err {
            FetcherError::Timeout(_) => Self::NetworkTimeout,
            FetcherError::Connect(_) => Self::NetworkOffline,
            FetcherError::Body(_) => Self::BodyInterrupted,
            FetcherError::Network(_) | FetcherError::Client(_) => Self::NetworkGeneric,
        }
    }

    /// Whether this failure is worth retrying under status-aware classification
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::AccessDenied(_) => false,
            // Other 4xx (400, 422, ...) will not change on retry.
            Self::UnexpectedStatus(code) => !(400..500).contains(code),
            _ => true,
        }
    }

    /// User-friendly description used in log messages
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::BodyInterrupted => "download interrupted",
            Self::RateLimit => "rate limit exceeded",
            Self::RequestTimeout(_) => "server timed out waiting for request",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::NotFound(_) => "resource not found",
            Self::AccessDenied(_) => "access denied",
            Self::UnexpectedStatus(_) => "unexpected response status",
            Self::NetworkGeneric => "network error",
        }
    }

    /// HTTP status behind this failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimit => Some(429),
            Self::RequestTimeout(code)
            | Self::ServerError(code)
            | Self::NotFound(code)
            | Self::AccessDenied(code)
            | Self::UnexpectedStatus(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status() {
            Some(code) => write!(f, "{} (HTTP {code})", self.description()),
            None => f.write_str(self.description()),
        }
    }
}

/// Policy deciding which failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryClassification {
    /// Retry transient failures; fail not-found and access-denied immediately
    #[default]
    ByStatus,
    /// Retry every failure up to the retry limit
    Uniform,
}

impl RetryClassification {
    /// Whether a failure of `kind` should be retried
    pub fn is_retryable(&self, kind: FailureKind) -> bool {
        match self {
            Self::ByStatus => kind.is_transient(),
            Self::Uniform => true,
        }
    }
}

impl FromStr for RetryClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "by-status" | "status" => Ok(Self::ByStatus),
            "uniform" => Ok(Self::Uniform),
            _ => Err(format!(
                "Invalid retry mode: {s}. Valid options: by-status, uniform"
            )),
        }
    }
}

impl fmt::Display for RetryClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByStatus => f.write_str("by-status"),
            Self::Uniform => f.write_str("uniform"),
        }
    }
}

/// Context for formatting retry messages
#[derive(Debug, Clone)]
pub struct RetryContext<'a> {
    /// Attempt that just failed (1-based)
    pub attempt: u32,
    /// Maximum attempts configured
    pub max_attempts: u32,
    /// Font being downloaded
    pub identifier: &'a str,
    /// Classification of the failure
    pub kind: FailureKind,
}

impl RetryContext<'_> {
    /// Message logged before another attempt
    pub fn format_retry(&self) -> String {
        format!(
            "Retrying {} (attempt {}/{}) after {}",
            self.identifier,
            self.attempt + 1,
            self.max_attempts,
            self.kind
        )
    }

    /// Message logged when the task gives up
    pub fn format_failure(&self) -> String {
        let retried = if self.kind.is_transient() || self.attempt > 1 {
            format!("after {} attempt(s)", self.attempt)
        } else {
            "without retry".to_string()
        };
        format!(
            "Download of {} failed {}: {}",
            self.identifier, retried, self.kind
        )
    }
}
