//! Atomic file writes
//!
//! Content is written to a `NamedTempFile` in the destination directory,
//! flushed and synced, then persisted (renamed) onto the final path. A reader
//! therefore sees either the complete file or no file at all. If anything
//! fails, or the future is dropped mid-write, the temp file is removed when
//! the `NamedTempFile` drops.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{OutputError, OutputResult};
use crate::fetcher::FetcherResult;

fn temp_file_for(path: &Path) -> OutputResult<NamedTempFile> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    Ok(NamedTempFile::new_in(parent)?)
}

fn persist(mut temp_file: NamedTempFile, path: &Path) -> OutputResult<()> {
    // Flush buffer to OS and sync to disk for durability before atomic rename
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| OutputError::IoError(e.error))?;

    // Fsync parent directory so the rename itself is durable
    if let Some(parent) = path.parent() {
        if let Ok(dir) = std::fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

/// Write a stream of chunks to `path` atomically
///
/// Returns the number of bytes written.
///
/// # Errors
/// - [`OutputError::StreamInterrupted`] if the stream yields an error
/// - [`OutputError::IoError`] on any filesystem failure
pub async fn write_stream_atomic<S>(path: &Path, mut stream: S) -> OutputResult<u64>
where
    S: Stream<Item = FetcherResult<Bytes>> + Unpin,
{
    let mut temp_file = temp_file_for(path)?;
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(OutputError::StreamInterrupted)?;
        temp_file.write_all(&chunk)?;
        written += chunk.len() as u64;
    }

    persist(temp_file, path)?;
    debug!(path = %path.display(), bytes = written, "Persisted file");
    Ok(written)
}

/// Write an in-memory buffer to `path` atomically
pub fn write_bytes_atomic(path: &Path, contents: &[u8]) -> OutputResult<()> {
    let mut temp_file = temp_file_for(path)?;
    temp_file.write_all(contents)?;
    persist(temp_file, path)
}
