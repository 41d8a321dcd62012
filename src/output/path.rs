//! Output directory layout
//!
//! Everything a run produces lives under one root:
//!
//! ```text
//! {root}/
//!   fonts/{slug}/{slug}.zip     downloaded archives
//!   logs/download.log           one line per outcome
//!   metadata/font-list.json     discovered catalog
//!   metadata/manifest.json      identifier → outcome for the last run
//! ```
//!
//! Archive paths depend only on the root and the slug, which is what makes
//! skip-existing work as a resume mechanism across runs.

use std::path::{Path, PathBuf};

use crate::identifier::ResourceIdentifier;

const FONTS_DIR: &str = "fonts";
const LOGS_DIR: &str = "logs";
const METADATA_DIR: &str = "metadata";
const ARCHIVE_EXTENSION: &str = "zip";
const LOG_FILE: &str = "download.log";
const MANIFEST_FILE: &str = "manifest.json";
const CATALOG_FILE: &str = "font-list.json";

/// Paths under the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Create a layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one subdirectory per font
    pub fn fonts_dir(&self) -> PathBuf {
        self.root.join(FONTS_DIR)
    }

    /// Directory holding run logs
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Directory holding the catalog and manifest
    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    /// Directory owned by one font
    pub fn artifact_dir(&self, identifier: &ResourceIdentifier) -> PathBuf {
        self.fonts_dir().join(identifier.as_str())
    }

    /// Final archive path for one font
    ///
    /// ```
    /// use fontshare_downloader::output::OutputLayout;
    /// use fontshare_downloader::ResourceIdentifier;
    /// use std::path::PathBuf;
    ///
    /// let layout = OutputLayout::new("downloads");
    /// let id = ResourceIdentifier::parse("satoshi").unwrap();
    /// assert_eq!(
    ///     layout.artifact_path(&id),
    ///     PathBuf::from("downloads/fonts/satoshi/satoshi.zip")
    /// );
    /// ```
    pub fn artifact_path(&self, identifier: &ResourceIdentifier) -> PathBuf {
        self.artifact_dir(identifier)
            .join(format!("{}.{ARCHIVE_EXTENSION}", identifier.as_str()))
    }

    /// Human-readable run log
    pub fn log_path(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE)
    }

    /// Run manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.metadata_dir().join(MANIFEST_FILE)
    }

    /// Discovered catalog
    pub fn catalog_path(&self) -> PathBuf {
        self.metadata_dir().join(CATALOG_FILE)
    }

    /// Create the fonts, logs, and metadata directories
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.fonts_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        std::fs::create_dir_all(self.metadata_dir())?;
        Ok(())
    }

    /// Size of an existing non-empty archive, if there is one
    pub fn existing_artifact_size(&self, identifier: &ResourceIdentifier) -> Option<u64> {
        std::fs::metadata(self.artifact_path(identifier))
            .ok()
            .filter(|meta| meta.is_file() && meta.len() > 0)
            .map(|meta| meta.len())
    }
}
