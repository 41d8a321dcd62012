//! Output layout and atomic writers

pub mod atomic;
pub mod path;

pub use atomic::{write_bytes_atomic, write_stream_atomic};
pub use path::OutputLayout;

use crate::fetcher::FetcherError;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Filesystem failure (create, write, sync, rename)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The source stream failed before the file was complete
    #[error("source stream interrupted: {0}")]
    StreamInterrupted(FetcherError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
