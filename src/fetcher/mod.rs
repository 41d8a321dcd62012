//! HTTP fetcher abstraction
//!
//! Discovery and downloading talk to the remote service only through the
//! [`HttpFetch`] trait, so the pipeline can be driven by the reqwest-backed
//! [`http::ReqwestFetcher`] in production and by in-memory fakes in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;

pub mod http;

pub use http::{HttpSettings, ReqwestFetcher};

/// Fetcher errors
///
/// These only describe transport-level failures. A response with a non-2xx
/// status is not an error at this layer; callers inspect
/// [`HttpResponse::status`] themselves.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetcherError {
    /// Request exceeded the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection refused, DNS failure, or similar
    #[error("connection failed: {0}")]
    Connect(String),

    /// Body stream broke off after the response started
    #[error("response body interrupted: {0}")]
    Body(String),

    /// Any other network error
    #[error("network error: {0}")]
    Network(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Stream of response body chunks
pub type BodyStream = Pin<Box<dyn Stream<Item = FetcherResult<Bytes>> + Send>>;

/// Response with a lazily consumed body
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Body chunks
    pub body: BodyStream,
}

impl HttpResponse {
    /// Create a response from a chunk stream
    pub fn new(status: u16, body: BodyStream) -> Self {
        Self { status, body }
    }

    /// Create a response with a single in-memory body chunk
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let chunk: FetcherResult<Bytes> = Ok(body.into());
        Self::new(status, Box::pin(futures_util::stream::iter(vec![chunk])))
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Collect the whole body
    pub async fn bytes(mut self) -> FetcherResult<Vec<u8>> {
        let mut buffer = Vec::new();
        while let Some(chunk) = self.body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer)
    }

    /// Collect the body as text, replacing invalid UTF-8
    pub async fn text(self) -> FetcherResult<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Minimal HTTP capability needed by discovery and downloading
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Issue a GET request
    ///
    /// Returns `Ok` for any response that arrived, whatever its status.
    async fn get(&self, url: &str) -> FetcherResult<HttpResponse>;

    /// Issue a HEAD request and return the status code
    async fn head(&self, url: &str) -> FetcherResult<u16>;
}
