//! Main entry point for the fontshare-downloader CLI

use clap::Parser;
use fontshare_downloader::cli::{error_exit_code, Cli};
use fontshare_downloader::shutdown::ShutdownCoordinator;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
///
/// Logs go to stderr so `--output-format json` leaves stdout parseable.
fn init_tracing(verbose: bool) {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fontshare_downloader={default_level}")));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Ctrl+C stops scheduling and abandons in-flight downloads
    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - stopping downloads...");
                shutdown.request_shutdown();
            }
        }
    });

    let code = match cli.execute(shutdown).await {
        Ok(code) => code,
        Err(e) => {
            let code = error_exit_code(&e);
            let e = anyhow::Error::from(e);
            error!("Command failed: {:#}", e);
            eprintln!("Error: {e:#}");
            code
        }
    };
    std::process::exit(code);
}
