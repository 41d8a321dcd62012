//! Catalog discovery
//!
//! Discovery runs an ordered list of [`DiscoveryStrategy`] implementations and
//! stops at the first one that yields at least one identifier. A strategy that
//! errors is logged and treated as having found nothing; only when every
//! strategy comes up empty does discovery fail with
//! [`DiscoveryError::Exhausted`].
//!
//! The standard order is:
//!
//! 1. [`structured::StructuredEndpointStrategy`] - JSON listing endpoints
//! 2. [`scrape::PageScrapeStrategy`] - embedded JSON or links on the public pages
//! 3. [`fallback::StaticFallbackStrategy`] - versioned built-in list

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::downloader::RateLimiter;
use crate::fetcher::{FetcherError, HttpFetch};
use crate::identifier::ResourceIdentifier;
use crate::metrics::HttpRequestMetrics;
use crate::CatalogEntry;

pub mod extract;
pub mod fallback;
pub mod scrape;
pub mod structured;

pub use fallback::{FallbackList, StaticFallbackStrategy};
pub use scrape::PageScrapeStrategy;
pub use structured::StructuredEndpointStrategy;

/// Discovery errors
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Every strategy produced zero identifiers
    #[error("no fonts discoverable (tried: {})", attempted.join(", "))]
    Exhausted {
        /// Strategy names in the order they were tried
        attempted: Vec<String>,
    },

    /// Transport failure
    #[error("request to {url} failed: {source}")]
    Http {
        /// Requested URL
        url: String,
        /// Underlying error
        source: FetcherError,
    },

    /// Non-success response
    #[error("{url} answered HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// Response status
        status: u16,
    },

    /// Response body could not be interpreted
    #[error("could not parse {url}: {message}")]
    Parse {
        /// Requested URL
        url: String,
        /// Parser message
        message: String,
    },

    /// Built-in fallback list is unusable
    #[error("fallback list unavailable: {0}")]
    Fallback(String),
}

/// Everything a strategy needs to talk to the service
#[derive(Clone)]
pub struct DiscoveryContext {
    /// HTTP seam
    pub fetcher: Arc<dyn HttpFetch>,
    /// Limiter shared with the download pool
    pub limiter: Arc<RateLimiter>,
    /// API base URL, e.g. `https://api.fontshare.com/v2`
    pub api_base: String,
    /// Public site URL, e.g. `https://www.fontshare.com`
    pub site_url: String,
}

impl DiscoveryContext {
    /// Create a context; trailing slashes on the URLs are dropped
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        limiter: Arc<RateLimiter>,
        api_base: impl Into<String>,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            site_url: site_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// GET `url` through the rate limiter and return the body as text
    pub async fn get_text(&self, url: &str) -> Result<String, DiscoveryError> {
        self.limiter.acquire().await;
        let request = HttpRequestMetrics::start("discovery", 1);

        let response = self.fetcher.get(url).await.map_err(|source| {
            request.record_network_error();
            DiscoveryError::Http {
                url: url.to_string(),
                source,
            }
        })?;
        request.record_complete(response.status);

        if !response.is_success() {
            return Err(DiscoveryError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        response.text().await.map_err(|source| DiscoveryError::Http {
            url: url.to_string(),
            source,
        })
    }

    /// HEAD `url` through the rate limiter and return the status
    pub async fn head_status(&self, url: &str) -> Result<u16, DiscoveryError> {
        self.limiter.acquire().await;
        let request = HttpRequestMetrics::start("probe", 1);
        match self.fetcher.head(url).await {
            Ok(status) => {
                request.record_complete(status);
                Ok(status)
            }
            Err(source) => {
                request.record_network_error();
                Err(DiscoveryError::Http {
                    url: url.to_string(),
                    source,
                })
            }
        }
    }
}

/// One way of finding the catalog
#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    /// Stable name recorded in the catalog and summary
    fn name(&self) -> &'static str;

    /// Try to produce catalog entries; an empty list means "found nothing"
    async fn attempt(&self, ctx: &DiscoveryContext) -> Result<Vec<CatalogEntry>, DiscoveryError>;
}

/// Deduplicated discovery result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Entries in discovery order, unique by identifier
    pub entries: Vec<CatalogEntry>,
    /// Name of the strategy that produced them
    pub strategy: String,
}

impl Catalog {
    /// Identifiers in discovery order
    pub fn identifiers(&self) -> Vec<ResourceIdentifier> {
        self.entries.iter().map(|e| e.identifier.clone()).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collapse duplicate identifiers, keeping the first occurrence
pub fn dedup_entries(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.identifier.clone()))
        .collect()
}

/// Runs strategies in order until one yields fonts
pub struct CatalogDiscoverer {
    context: DiscoveryContext,
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl CatalogDiscoverer {
    /// Discoverer with an explicit strategy order
    pub fn new(context: DiscoveryContext, strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        Self {
            context,
            strategies,
        }
    }

    /// Structured endpoints, then page scrape, then the built-in list
    pub fn standard(context: DiscoveryContext, probe_candidates: bool) -> Self {
        Self::new(
            context,
            vec![
                Box::new(StructuredEndpointStrategy::default()),
                Box::new(PageScrapeStrategy::default()),
                Box::new(StaticFallbackStrategy::embedded().with_probe(probe_candidates)),
            ],
        )
    }

    /// Strategy names in the order they are tried
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Produce a non-empty, duplicate-free catalog
    ///
    /// # Errors
    /// [`DiscoveryError::Exhausted`] when every strategy yields nothing.
    pub async fn discover(&self) -> Result<Catalog, DiscoveryError> {
        let mut attempted = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let name = strategy.name();
            attempted.push(name.to_string());

            let span = info_span!("discovery", strategy = name);
            match strategy.attempt(&self.context).instrument(span).await {
                Ok(entries) => {
                    let found = entries.len();
                    let entries = dedup_entries(entries);
                    if entries.is_empty() {
                        debug!(strategy = name, "Strategy yielded no fonts");
                        continue;
                    }
                    if entries.len() < found {
                        debug!(
                            strategy = name,
                            duplicates = found - entries.len(),
                            "Collapsed duplicate identifiers"
                        );
                    }
                    info!(strategy = name, fonts = entries.len(), "Discovered fonts");
                    return Ok(Catalog {
                        entries,
                        strategy: name.to_string(),
                    });
                }
                Err(e) => {
                    warn!(strategy = name, error = %e, "Discovery strategy failed");
                }
            }
        }

        Err(DiscoveryError::Exhausted { attempted })
    }
}
