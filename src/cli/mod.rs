//! CLI command implementations

pub mod download;
pub mod error;

pub use download::{error_exit_code, exit_code, Cli, Commands, OutputFormat};
pub use error::CliError;

/// Run finished, including runs with failed downloads
pub const EXIT_SUCCESS: i32 = 0;

/// Discovery exhausted, invalid configuration, or report persistence failure
pub const EXIT_FAILURE: i32 = 1;

/// Run interrupted by Ctrl+C
pub const EXIT_CANCELLED: i32 = 130;
