//! Shared test fixtures: an in-memory `HttpFetch` and config helpers

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use fontshare_downloader::fetcher::{FetcherError, FetcherResult, HttpFetch, HttpResponse};
use fontshare_downloader::PipelineConfig;

pub const API_BASE: &str = "http://api.fonts.test/v2";
pub const SITE_URL: &str = "http://www.fonts.test";

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with this body
    Ok(Vec<u8>),
    /// Non-success status with an empty body
    Status(u16),
    /// 200 whose body breaks off after these bytes
    Interrupted(Vec<u8>),
    /// Transport timeout before any response
    Timeout,
}

impl Reply {
    pub fn archive(slug: &str) -> Self {
        Reply::Ok(format!("PK\u{3}\u{4}{slug}").into_bytes())
    }

    pub fn json(body: &str) -> Self {
        Reply::Ok(body.as_bytes().to_vec())
    }

    pub fn html(body: &str) -> Self {
        Reply::Ok(body.as_bytes().to_vec())
    }

    fn into_response(self) -> FetcherResult<HttpResponse> {
        match self {
            Reply::Ok(body) => Ok(HttpResponse::from_bytes(200, body)),
            Reply::Status(status) => Ok(HttpResponse::from_bytes(status, Vec::new())),
            Reply::Interrupted(partial) => {
                let chunks: Vec<FetcherResult<Bytes>> = vec![
                    Ok(Bytes::from(partial)),
                    Err(FetcherError::Body("connection reset by peer".to_string())),
                ];
                Ok(HttpResponse::new(200, Box::pin(futures::stream::iter(chunks))))
            }
            Reply::Timeout => Err(FetcherError::Timeout("operation timed out".to_string())),
        }
    }
}

/// Scripted fetcher; unknown URLs answer 404
///
/// Each URL holds a queue of replies. The last reply repeats once the queue
/// is down to one element.
#[derive(Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    heads: Mutex<HashMap<String, u16>>,
    gets: Mutex<Vec<(String, Instant)>>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn route(&self, url: impl Into<String>, replies: Vec<Reply>) {
        self.routes.lock().unwrap().insert(url.into(), replies.into());
    }

    pub fn font(&self, slug: &str, replies: Vec<Reply>) {
        self.route(download_url(slug), replies);
    }

    pub fn head_status(&self, url: impl Into<String>, status: u16) {
        self.heads.lock().unwrap().insert(url.into(), status);
    }

    pub fn get_urls(&self) -> Vec<String> {
        self.gets.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn download_requests(&self) -> Vec<(String, Instant)> {
        self.gets
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u.contains("/fonts/download/"))
            .cloned()
            .collect()
    }

    pub fn requests_for(&self, slug: &str) -> usize {
        let url = download_url(slug);
        self.gets.lock().unwrap().iter().filter(|(u, _)| *u == url).count()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::Status(404)),
            None => Reply::Status(404),
        }
    }
}

#[async_trait]
impl HttpFetch for FakeFetcher {
    async fn get(&self, url: &str) -> FetcherResult<HttpResponse> {
        self.gets
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.next_reply(url).into_response()
    }

    async fn head(&self, url: &str) -> FetcherResult<u16> {
        Ok(self.heads.lock().unwrap().get(url).copied().unwrap_or(404))
    }
}

pub fn download_url(slug: &str) -> String {
    format!("{API_BASE}/fonts/download/{slug}")
}

/// Config pointed at the fake hosts with throttling disabled
pub fn test_config(output_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        output_dir: output_dir.to_path_buf(),
        rate_limit_seconds: 0.0,
        api_base_url: API_BASE.to_string(),
        site_url: SITE_URL.to_string(),
        ..PipelineConfig::default()
    }
}

/// Files left in a font directory, if it exists
pub fn dir_entries(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}
