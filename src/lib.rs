//! # Fontshare Downloader Library
//!
//! A bulk downloader for the font archives published by Fontshare. It discovers
//! the catalog of font slugs exposed by the service and retrieves every archive
//! through the per-font download endpoint, writing results into a structured
//! output directory.
//!
//! ## Features
//!
//! - **Resilient Discovery**: Structured API endpoints, page scraping, and a
//!   versioned static fallback list, tried in order until one yields fonts
//! - **Bounded Concurrency**: At most `max_concurrent` downloads in flight
//! - **Rate Limiting**: A single limiter shared by every outbound request
//! - **Retry Classification**: Transient failures are retried, permanent ones are not
//! - **Resume**: Existing non-empty archives are skipped on re-runs
//! - **Atomic Writes**: Archives land at their final path only once fully written
//! - **Manifest & Log**: Every run persists a JSON manifest and a human-readable log
//!
//! ## Quick Start
//!
//! ```no_run
//! use fontshare_downloader::{Pipeline, PipelineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig {
//!     output_dir: "./downloads".into(),
//!     max_concurrent: 4,
//!     ..PipelineConfig::default()
//! };
//!
//! let mut pipeline = Pipeline::from_config(config)?;
//! let summary = pipeline.run().await?;
//! println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`identifier`] - Font slug validation and normalization
//! - [`fetcher`] - HTTP seam ([`fetcher::HttpFetch`]) and the reqwest implementation
//! - [`discovery`] - Ordered discovery strategies with fallback
//! - [`downloader`] - Rate limiter, retry classification, and the worker pool
//! - [`output`] - Output directory layout and atomic file writes
//! - [`report`] - Result aggregation, run summary, manifest, and log
//! - [`pipeline`] - Orchestration of discovery, download, and summarizing
//! - [`shutdown`] - Cooperative cancellation

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// CLI command implementations
pub mod cli;

/// Pipeline configuration
pub mod config;

/// Catalog discovery strategies
pub mod discovery;

/// Download worker pool and rate limiting
pub mod downloader;

/// HTTP fetchers
pub mod fetcher;

/// Font slug parsing and validation
pub mod identifier;

/// Observability metrics
pub mod metrics;

/// Output layout and atomic writers
pub mod output;

/// Discovery → download → summary orchestration
pub mod pipeline;

/// Result aggregation and persisted reports
pub mod report;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

// Re-export commonly used types
pub use config::{ConfigError, PipelineConfig};
pub use identifier::ResourceIdentifier;
pub use pipeline::{Pipeline, PipelineError, PipelineState};
pub use report::{DownloadOutcome, OutcomeStatus, RunSummary};

/// One discovered catalog item
///
/// Produced once per discovery run and never modified afterwards. Display
/// metadata is only present when the discovery source exposed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Font slug
    pub identifier: ResourceIdentifier,
    /// Human-readable font name, if the source provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Font category (e.g. "sans", "serif"), if the source provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl CatalogEntry {
    /// Create an entry without display metadata
    pub fn new(identifier: ResourceIdentifier) -> Self {
        Self {
            identifier,
            display_name: None,
            category: None,
        }
    }

    /// Attach a display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Attach a category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl From<ResourceIdentifier> for CatalogEntry {
    fn from(identifier: ResourceIdentifier) -> Self {
        Self::new(identifier)
    }
}
