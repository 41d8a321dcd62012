//! CLI error types and conversions

use crate::config::ConfigError;
use crate::pipeline::PipelineError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Pipeline error
    #[error("{0}")]
    PipelineError(#[from] PipelineError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(#[from] ConfigError),

    /// Result could not be rendered
    #[error("output error: {0}")]
    OutputError(String),
}
