//! Command-line surface and result rendering

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

use super::{CliError, EXIT_CANCELLED, EXIT_FAILURE, EXIT_SUCCESS};
use crate::config::{PipelineConfig, DEFAULT_API_BASE_URL, DEFAULT_SITE_URL};
use crate::discovery::Catalog;
use crate::downloader::config::MAX_RATE_LIMIT_SECS;
use crate::downloader::RetryClassification;
use crate::pipeline::Pipeline;
use crate::report::{CatalogSnapshot, RunSummary};
use crate::shutdown::SharedShutdown;

/// Parse a seconds value in `0..=MAX_RATE_LIMIT_SECS`
fn parse_rate_limit(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;
    if !(0.0..=MAX_RATE_LIMIT_SECS).contains(&value) {
        return Err(format!(
            "rate limit must be between 0 and {MAX_RATE_LIMIT_SECS} seconds"
        ));
    }
    Ok(value)
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Fontshare bulk downloader
#[derive(Parser, Debug)]
#[command(name = "fontshare-downloader")]
#[command(about = "Download every font archive published on Fontshare", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute (defaults to `download`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output directory
    #[arg(short, long, global = true, default_value = "./downloads")]
    pub output_dir: PathBuf,

    /// Minimum seconds between requests
    #[arg(short, long, global = true, default_value = "1.0", value_parser = parse_rate_limit)]
    pub rate_limit: f64,

    /// Downloads in flight at once (1-32)
    #[arg(short = 'c', long, global = true, default_value = "3")]
    pub max_concurrent: usize,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Re-download fonts whose archive already exists
    #[arg(long, visible_alias = "force", global = true, default_value_t = false)]
    pub no_skip_existing: bool,

    /// Retries after the first failed attempt (0-20)
    #[arg(long, global = true, default_value = "3", value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    pub timeout: u64,

    /// Which failures are retried: by-status or uniform
    #[arg(long, global = true, default_value = "by-status")]
    pub retry_mode: RetryClassification,

    /// API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_BASE_URL)]
    pub api_base: String,

    /// Public site URL used for scraping
    #[arg(long, global = true, default_value = DEFAULT_SITE_URL)]
    pub site_url: String,

    /// Probe extra candidate fonts when falling back to the built-in list
    #[arg(long, global = true, default_value_t = false)]
    pub probe_candidates: bool,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,

    /// Disable the progress bar
    #[arg(long, global = true, default_value_t = false)]
    pub no_progress: bool,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,
}

/// CLI commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Discover the catalog and download every font
    Download,

    /// Only discover the catalog and print it
    Discover,
}

impl Cli {
    /// Pipeline configuration described by the flags
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            output_dir: self.output_dir.clone(),
            rate_limit_seconds: self.rate_limit,
            max_concurrent: self.max_concurrent,
            verbose: self.verbose,
            skip_existing: !self.no_skip_existing,
            max_retries: self.max_retries,
            request_timeout_secs: self.timeout,
            retry_classification: self.retry_mode,
            api_base_url: self.api_base.clone(),
            site_url: self.site_url.clone(),
            probe_candidates: self.probe_candidates,
            ..PipelineConfig::default()
        }
    }

    fn show_progress(&self) -> bool {
        !self.no_progress && self.output_format == OutputFormat::Human
    }

    /// Run the selected command and return the process exit code
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<i32, CliError> {
        let config = self.to_config();
        config.validate()?;

        if let Some(addr) = self.metrics_addr {
            if let Err(e) = crate::metrics::init_metrics(addr).await {
                warn!(error = %e, "Metrics exporter unavailable; continuing without it");
            }
        }

        let pipeline = Pipeline::from_config(config)?.with_shutdown(shutdown);

        match self.command.unwrap_or(Commands::Download) {
            Commands::Discover => {
                let catalog = pipeline.discover().await?;
                match self.output_format {
                    OutputFormat::Json => output_catalog_json(&catalog)?,
                    OutputFormat::Human => output_catalog_human(&catalog),
                }
                Ok(EXIT_SUCCESS)
            }
            Commands::Download => self.execute_download(pipeline).await,
        }
    }

    async fn execute_download(&self, pipeline: Pipeline) -> Result<i32, CliError> {
        let progress = self.show_progress().then(create_progress_bar);
        let mut pipeline = match &progress {
            Some(progress) => pipeline.with_progress(progress.clone()),
            None => pipeline,
        };

        info!(
            output = %self.output_dir.display(),
            concurrency = self.max_concurrent,
            rate_limit = self.rate_limit,
            "Starting Fontshare download"
        );
        let result = pipeline.run().await;
        if let Some(progress) = &progress {
            progress.finish_and_clear();
        }
        let summary = result?;

        match self.output_format {
            OutputFormat::Json => output_json(&summary)?,
            OutputFormat::Human => output_human(&summary),
        }
        Ok(exit_code(&summary))
    }
}

/// Exit code for a finished run
///
/// Failed downloads do not change the exit code; only cancellation does.
pub fn exit_code(summary: &RunSummary) -> i32 {
    if summary.cancelled {
        EXIT_CANCELLED
    } else {
        EXIT_SUCCESS
    }
}

/// Exit code for a command that returned an error
///
/// Exhausted discovery, bad configuration and report persistence failures all
/// end the process with [`EXIT_FAILURE`].
pub fn error_exit_code(error: &CliError) -> i32 {
    match error {
        CliError::PipelineError(_) | CliError::ConfigurationError(_) | CliError::OutputError(_) => {
            EXIT_FAILURE
        }
    }
}

/// Render a byte count with binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn output_json(summary: &RunSummary) -> Result<(), CliError> {
    let json = serde_json::to_string(summary).map_err(|e| CliError::OutputError(e.to_string()))?;
    println!("{json}");
    Ok(())
}

fn output_human(summary: &RunSummary) {
    if summary.cancelled {
        println!("\nDownload cancelled.");
    } else {
        println!("\nDownload completed!");
    }
    if let Some(strategy) = &summary.discovery_strategy {
        println!("Discovered via: {strategy}");
    }
    println!(
        "Attempted: {}  Succeeded: {}  Failed: {}  Skipped: {}",
        summary.attempted, summary.succeeded, summary.failed, summary.skipped
    );
    println!("Total size: {}", format_bytes(summary.total_bytes));
    println!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    if let Some(log_path) = &summary.log_path {
        println!("Log: {}", log_path.display());
    }
    if let Some(manifest_path) = &summary.manifest_path {
        println!("Manifest: {}", manifest_path.display());
    }

    let failures: Vec<_> = summary.failures().collect();
    if !failures.is_empty() {
        println!("\nFailed fonts:");
        for outcome in failures {
            println!(
                "  - {}: {}",
                outcome.identifier,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

fn output_catalog_json(catalog: &Catalog) -> Result<(), CliError> {
    let snapshot = CatalogSnapshot::from_catalog(catalog);
    let json =
        serde_json::to_string(&snapshot).map_err(|e| CliError::OutputError(e.to_string()))?;
    println!("{json}");
    Ok(())
}

fn output_catalog_human(catalog: &Catalog) {
    println!(
        "Discovered {} fonts via {}:",
        catalog.len(),
        catalog.strategy
    );
    for entry in &catalog.entries {
        match &entry.display_name {
            Some(name) => println!("  {} ({name})", entry.identifier),
            None => println!("  {}", entry.identifier),
        }
    }
}

/// Progress bar advanced once per finished font
fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb
}
