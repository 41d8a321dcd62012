//! reqwest-backed [`HttpFetch`] implementation
//!
//! One `reqwest::Client` is built per run and shared by discovery and every
//! download worker so connection pooling spans the whole pipeline. The client
//! always carries explicit timeouts; a stalled connection must not hold a
//! worker slot forever.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{FetcherError, FetcherResult, HttpFetch, HttpResponse};
use crate::downloader::config::{
    HTTP_CONNECT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS, USER_AGENT,
};

/// Timeouts and identification for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Time allowed to establish a TCP connection
    pub connect_timeout: Duration,
    /// Time allowed for a whole request, body included
    pub request_timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Production fetcher using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Build a fetcher with the given settings
    ///
    /// # Errors
    /// Returns [`FetcherError::Client`] if the TLS backend cannot be initialized.
    pub fn new(settings: &HttpSettings) -> FetcherResult<Self> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| FetcherError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

/// Map a reqwest error onto the transport taxonomy
fn map_reqwest_error(err: reqwest::Error) -> FetcherError {
    if err.is_timeout() {
        FetcherError::Timeout(err.to_string())
    } else if err.is_connect() {
        FetcherError::Connect(err.to_string())
    } else if err.is_body() || err.is_decode() {
        FetcherError::Body(err.to_string())
    } else {
        FetcherError::Network(err.to_string())
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> FetcherResult<HttpResponse> {
        debug!(url = %url, "GET");
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error));
        Ok(HttpResponse::new(status, Box::pin(body)))
    }

    async fn head(&self, url: &str) -> FetcherResult<u16> {
        debug!(url = %url, "HEAD");
        let response = self.client.head(url).send().await.map_err(map_reqwest_error)?;
        Ok(response.status().as_u16())
    }
}
