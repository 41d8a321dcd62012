//! Persisted run manifest and catalog snapshot
//!
//! Both files are JSON, written atomically through
//! [`crate::output::write_bytes_atomic`]. The manifest is keyed by slug in a
//! `BTreeMap` so consecutive runs diff cleanly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{duration_millis, OutcomeStatus, ReportError, RunSummary};
use crate::discovery::Catalog;
use crate::identifier::ResourceIdentifier;
use crate::output::write_bytes_atomic;
use crate::CatalogEntry;

/// Current manifest schema version
pub const MANIFEST_SCHEMA_VERSION: &str = "1.0.0";

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let json = serde_json::to_vec_pretty(value)?;
    write_bytes_atomic(path, &json).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Wrote JSON report");
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ReportError> {
    let contents = std::fs::read(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&contents)?)
}

/// Manifest entry for one font
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Terminal status
    pub status: OutcomeStatus,
    /// Archive size, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    /// Last error, when failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Requests issued
    pub attempts: u32,
    /// Task wall time
    #[serde(rename = "elapsed_ms", with = "duration_millis")]
    pub elapsed: std::time::Duration,
    /// Archive path
    pub path: PathBuf,
}

/// Run totals repeated at the top of the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTotals {
    /// Tasks that reached a terminal status
    pub attempted: usize,
    /// Archives written
    pub succeeded: usize,
    /// Tasks that gave up
    pub failed: usize,
    /// Tasks resolved from existing archives
    pub skipped: usize,
    /// Bytes on disk for succeeded and skipped fonts
    pub total_bytes: u64,
    /// Run wall time
    #[serde(rename = "elapsed_ms", with = "duration_millis")]
    pub elapsed: std::time::Duration,
}

/// Mapping of slug to outcome for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Schema version
    pub schema_version: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Discovery strategy that produced the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_strategy: Option<String>,
    /// Whether the run was interrupted
    pub cancelled: bool,
    /// Totals
    pub totals: ManifestTotals,
    /// Outcome per slug
    pub outcomes: BTreeMap<ResourceIdentifier, ManifestEntry>,
}

impl Manifest {
    /// Build a manifest from a finished run
    pub fn from_summary(summary: &RunSummary) -> Self {
        let outcomes = summary
            .outcomes
            .iter()
            .map(|o| {
                (
                    o.identifier.clone(),
                    ManifestEntry {
                        status: o.status,
                        bytes: o.bytes,
                        error: o.error.clone(),
                        attempts: o.attempts,
                        elapsed: o.elapsed,
                        path: o.destination.clone(),
                    },
                )
            })
            .collect();

        Self {
            schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
            started_at: summary.started_at,
            finished_at: summary.finished_at,
            discovery_strategy: summary.discovery_strategy.clone(),
            cancelled: summary.cancelled,
            totals: ManifestTotals {
                attempted: summary.attempted,
                succeeded: summary.succeeded,
                failed: summary.failed,
                skipped: summary.skipped,
                total_bytes: summary.total_bytes,
                elapsed: summary.elapsed,
            },
            outcomes,
        }
    }

    /// Write atomically to `path`
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        write_json(path, self)
    }

    /// Read a manifest back
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        read_json(path)
    }
}

/// Discovered catalog as persisted under `metadata/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Slugs in discovery order
    pub fonts: Vec<ResourceIdentifier>,
    /// Number of slugs
    pub total_count: usize,
    /// When discovery finished
    pub discovery_time: DateTime<Utc>,
    /// Strategy that produced the catalog
    pub strategy: String,
    /// Entries with whatever display metadata was found
    pub entries: Vec<CatalogEntry>,
}

impl CatalogSnapshot {
    /// Snapshot a catalog as of now
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            fonts: catalog.identifiers(),
            total_count: catalog.len(),
            discovery_time: Utc::now(),
            strategy: catalog.strategy.clone(),
            entries: catalog.entries.clone(),
        }
    }

    /// Write atomically to `path`
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        write_json(path, self)
    }

    /// Read a snapshot back
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        read_json(path)
    }
}
