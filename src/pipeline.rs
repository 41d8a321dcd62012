//! Pipeline orchestration
//!
//! A [`Pipeline`] runs once: discovery, then the download pool, then the
//! summary and manifest.
//!
//! ```text
//! Idle → Discovering → Downloading → Summarizing → Done
//!             └──────→ Failed
//! ```
//!
//! `Failed` is only reachable from `Discovering`. Individual download
//! failures end up in the summary, never in the pipeline state.

use indicatif::ProgressBar;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::{ConfigError, PipelineConfig};
use crate::discovery::{
    Catalog, CatalogDiscoverer, DiscoveryContext, DiscoveryError, DiscoveryStrategy,
};
use crate::downloader::{DownloadExecutor, RateLimiter};
use crate::fetcher::{FetcherError, HttpFetch, ReqwestFetcher};
use crate::output::OutputLayout;
use crate::report::{
    CatalogSnapshot, Manifest, ReportError, ResultAggregator, RunContext, RunSummary,
};
use crate::shutdown::{self, SharedShutdown};

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started
    Idle,
    /// Running discovery strategies
    Discovering,
    /// Worker pool running
    Downloading,
    /// Folding outcomes and writing the manifest
    Summarizing,
    /// Manifest and log written
    Done,
    /// Discovery found nothing
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Downloading => "downloading",
            Self::Summarizing => "summarizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Every discovery strategy came up empty
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    Fetcher(#[from] FetcherError),

    /// Output directories could not be created
    #[error("failed to prepare output directory {path}: {source}")]
    Output {
        /// Output root
        path: std::path::PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Log or manifest could not be written
    #[error("failed to write run report: {0}")]
    Report(#[from] ReportError),

    /// `run` called on a pipeline that already left `Idle`
    #[error("pipeline already ran (state: {0})")]
    AlreadyRan(PipelineState),
}

/// Discovery → download → summary orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    layout: OutputLayout,
    fetcher: Arc<dyn HttpFetch>,
    limiter: Arc<RateLimiter>,
    discoverer: CatalogDiscoverer,
    shutdown: Option<SharedShutdown>,
    progress: Option<ProgressBar>,
    state: PipelineState,
}

impl Pipeline {
    /// Build a pipeline over an existing HTTP seam
    ///
    /// # Errors
    /// [`PipelineError::Config`] if the config does not validate.
    pub fn new(config: PipelineConfig, fetcher: Arc<dyn HttpFetch>) -> Result<Self, PipelineError> {
        config.validate()?;

        let limiter = Arc::new(RateLimiter::from_secs_f64(config.rate_limit_seconds));
        let context = DiscoveryContext::new(
            fetcher.clone(),
            limiter.clone(),
            config.api_base_url.clone(),
            config.site_url.clone(),
        );
        let discoverer = CatalogDiscoverer::standard(context, config.probe_candidates);

        Ok(Self {
            layout: OutputLayout::new(config.output_dir.clone()),
            config,
            fetcher,
            limiter,
            discoverer,
            shutdown: None,
            progress: None,
            state: PipelineState::Idle,
        })
    }

    /// Build a pipeline backed by reqwest
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let fetcher = ReqwestFetcher::new(&config.http_settings())?;
        Self::new(config, Arc::new(fetcher))
    }

    /// Replace the discovery strategy order
    pub fn with_discoverer(mut self, strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        self.discoverer = CatalogDiscoverer::new(self.discovery_context(), strategies);
        self
    }

    /// Attach a shared shutdown handle for graceful cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Advance `progress` as downloads finish
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Configuration in effect
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Output layout
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    fn discovery_context(&self) -> DiscoveryContext {
        DiscoveryContext::new(
            self.fetcher.clone(),
            self.limiter.clone(),
            self.config.api_base_url.clone(),
            self.config.site_url.clone(),
        )
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "Pipeline state change");
        self.state = next;
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }

    /// Run discovery only and persist the catalog snapshot
    ///
    /// Does not change the pipeline state.
    pub async fn discover(&self) -> Result<Catalog, PipelineError> {
        let catalog = self.discoverer.discover().await?;
        self.persist_catalog(&catalog);
        Ok(catalog)
    }

    fn persist_catalog(&self, catalog: &Catalog) {
        let path = self.layout.catalog_path();
        match CatalogSnapshot::from_catalog(catalog).save(&path) {
            Ok(()) => debug!(path = %path.display(), "Saved catalog"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to save catalog"),
        }
    }

    /// Run the whole pipeline once
    ///
    /// # Errors
    /// - [`PipelineError::Discovery`] when no fonts could be discovered; no
    ///   downloads are attempted and the state becomes `Failed`
    /// - [`PipelineError::Report`] when the manifest cannot be written
    /// - [`PipelineError::Output`] when the output root cannot be created
    pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::AlreadyRan(self.state));
        }
        let span = info_span!("pipeline", output = %self.layout.root().display());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&mut self) -> Result<RunSummary, PipelineError> {
        let mut context = RunContext::start();

        self.layout
            .ensure_directories()
            .map_err(|source| PipelineError::Output {
                path: self.layout.root().to_path_buf(),
                source,
            })?;
        let aggregator = ResultAggregator::with_log_file(&self.layout.log_path())?;

        self.transition(PipelineState::Discovering);
        let discovered = tokio::select! {
            biased;
            _ = shutdown::cancelled(self.shutdown.as_ref()) => None,
            result = self.discoverer.discover() => Some(result),
        };
        let identifiers = match discovered {
            Some(Ok(catalog)) => {
                self.persist_catalog(&catalog);
                context.discovery_strategy = Some(catalog.strategy.clone());
                aggregator.log_event(&format!(
                    "started: {} fonts discovered via {}",
                    catalog.len(),
                    catalog.strategy
                ));
                catalog.identifiers()
            }
            Some(Err(e)) => {
                error!(error = %e, "Discovery failed; nothing to download");
                aggregator.log_event(&format!("aborted: {e}"));
                self.transition(PipelineState::Failed);
                return Err(e.into());
            }
            None => {
                // Nothing scheduled; the summary still records the cancellation
                warn!("Shutdown requested during discovery; skipping downloads");
                aggregator.log_event("cancelled during discovery");
                Vec::new()
            }
        };

        self.transition(PipelineState::Downloading);
        let mut executor = DownloadExecutor::new(
            self.fetcher.clone(),
            self.limiter.clone(),
            self.layout.clone(),
            self.config.api_base_url.clone(),
        )
        .with_options(self.config.download_options());
        if let Some(shutdown) = &self.shutdown {
            executor = executor.with_shutdown(shutdown.clone());
        }
        if let Some(progress) = &self.progress {
            progress.set_length(identifiers.len() as u64);
            executor = executor.with_progress(progress.clone());
        }
        executor.download_all(&identifiers, &aggregator).await;

        self.transition(PipelineState::Summarizing);
        context.cancelled = self.shutdown_requested();
        let mut summary = aggregator.summarize(context);

        let manifest_path = self.layout.manifest_path();
        Manifest::from_summary(&summary).save(&manifest_path)?;
        summary.manifest_path = Some(manifest_path);

        self.transition(PipelineState::Done);
        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Run complete"
        );
        Ok(summary)
    }
}
